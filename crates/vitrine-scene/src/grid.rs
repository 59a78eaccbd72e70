use vitrine_3d::{LineVertex, color_from_hex};

/// Faint square reference grid lying flat under the model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroundGrid {
    pub size: f32,
    pub divisions: u32,
    pub color: u32,
    pub opacity: f32,
    pub elevation: f32,
}

impl Default for GroundGrid {
    fn default() -> Self {
        Self {
            size: 15.0,
            divisions: 10,
            color: 0x88aaff,
            opacity: 0.08,
            elevation: -4.0,
        }
    }
}

impl GroundGrid {
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        let divisions = self.divisions.max(1);
        let half = self.size / 2.0;
        let step = self.size / divisions as f32;
        let color = color_from_hex(self.color).extend(self.opacity).to_array();
        let y = self.elevation;

        let mut vertices = Vec::with_capacity(4 * (divisions as usize + 1));
        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            vertices.push(LineVertex {
                position: [-half, y, k],
                color,
            });
            vertices.push(LineVertex {
                position: [half, y, k],
                color,
            });
            vertices.push(LineVertex {
                position: [k, y, -half],
                color,
            });
            vertices.push(LineVertex {
                position: [k, y, half],
                color,
            });
        }
        vertices
    }
}
