use image::{Rgba, RgbaImage};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: [u8; 3],
}

pub const BACKDROP_STOPS: [GradientStop; 3] = [
    GradientStop {
        offset: 0.0,
        color: [0xe8, 0xf4, 0xff],
    },
    GradientStop {
        offset: 0.7,
        color: [0xc2, 0xe0, 0xff],
    },
    GradientStop {
        offset: 1.0,
        color: [0xa3, 0xd1, 0xff],
    },
];

pub const BACKDROP_SIZE: u32 = 1024;

pub struct Background {
    pub image: RgbaImage,
}

impl Background {
    pub fn radial(size: u32) -> Self {
        Self {
            image: radial_gradient(size, &BACKDROP_STOPS),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn rgba(&self) -> &[u8] {
        self.image.as_raw()
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::radial(BACKDROP_SIZE)
    }
}

fn sample_stops(stops: &[GradientStop], t: f32) -> [u8; 3] {
    let Some(first) = stops.first() else {
        return [0, 0, 0];
    };
    if t <= first.offset {
        return first.color;
    }

    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let f = (t - a.offset) / span;
            let mut out = [0u8; 3];
            for (i, channel) in out.iter_mut().enumerate() {
                let v = a.color[i] as f32 + (b.color[i] as f32 - a.color[i] as f32) * f;
                *channel = v.round().clamp(0.0, 255.0) as u8;
            }
            return out;
        }
    }

    stops[stops.len() - 1].color
}

/// Square image with a radial gradient centered in the middle, reaching the
/// last stop at the edge midpoints and holding it into the corners.
pub fn radial_gradient(size: u32, stops: &[GradientStop]) -> RgbaImage {
    let size = size.max(1);
    let half = size as f32 / 2.0;

    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - half;
        let dy = y as f32 + 0.5 - half;
        let t = ((dx * dx + dy * dy).sqrt() / half).min(1.0);
        let [r, g, b] = sample_stops(stops, t);
        Rgba([r, g, b, 255])
    })
}
