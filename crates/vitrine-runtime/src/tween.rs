use std::f32::consts::TAU;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Ease {
    Linear,
    Power2Out,
    ElasticOut { amplitude: f32, period: f32 },
}

impl Ease {
    /// Maps normalized time in `[0, 1]` to progress. Elastic overshoots 1.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power2Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::ElasticOut { amplitude, period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let p1 = amplitude.max(1.0);
                let period = period / amplitude.clamp(f32::EPSILON, 1.0);
                let p3 = period / TAU * (1.0 / p1).asin();
                p1 * 2f32.powf(-10.0 * t) * ((t - p3) * TAU / period).sin() + 1.0
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub ease: Ease,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration,
            ease,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
    }

    pub fn value(&self) -> f32 {
        let t = if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        };
        self.from + (self.to - self.from) * self.ease.apply(t)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

pub const ENTRANCE_DURATION: f32 = 1.8;
pub const ENTRANCE_START_Y: f32 = -2.0;
pub const ENTRANCE_ELASTIC: Ease = Ease::ElasticOut {
    amplitude: 1.2,
    period: 0.5,
};

/// Scale-in and rise of a freshly loaded model, played together.
#[derive(Copy, Clone, Debug)]
pub struct Entrance {
    pub scale: Tween,
    pub rise: Tween,
}

impl Entrance {
    pub fn new(target_scale: f32, target_y: f32) -> Self {
        Self {
            scale: Tween::new(0.0, target_scale, ENTRANCE_DURATION, ENTRANCE_ELASTIC),
            rise: Tween::new(ENTRANCE_START_Y, target_y, ENTRANCE_DURATION, Ease::Power2Out),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.scale.advance(dt);
        self.rise.advance(dt);
    }

    pub fn is_finished(&self) -> bool {
        self.scale.is_finished() && self.rise.is_finished()
    }
}
