use vitrine_gltf::LoadProgress;

/// Status panel drawn over the viewport while a model loads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub visible: bool,
    pub text: String,
    pub details: String,
    /// Fraction in `[0, 1]`.
    pub progress: f32,
}

impl Overlay {
    pub fn show_loading(&mut self) {
        self.visible = true;
        self.text = "Loading 3D model...".into();
        self.details = "Preparing...".into();
        self.progress = 0.1;
    }

    /// Progress without a known total leaves the panel as is.
    pub fn set_progress(&mut self, progress: &LoadProgress) {
        let Some(percent) = progress.percent() else {
            return;
        };
        self.text = format!("Loading 3D model... {percent}%");
        self.details = format!("Loaded: {:.2} MB", progress.loaded_megabytes());
        self.progress = f32::from(percent) / 100.0;
    }

    pub fn show_loaded(&mut self) {
        self.text = "Model loaded!".into();
        self.details = "Entrance animation...".into();
        self.progress = 1.0;
    }

    pub fn show_fallback(&mut self) {
        self.text = "Failed to load model".into();
        self.details = "Using fallback model".into();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_text() {
        let mut overlay = Overlay::default();
        overlay.show_loading();
        assert!(overlay.visible);
        assert_eq!(overlay.progress, 0.1);

        overlay.set_progress(&LoadProgress {
            loaded: 3 * 1024 * 1024,
            total: Some(4 * 1024 * 1024),
        });
        assert_eq!(overlay.text, "Loading 3D model... 75%");
        assert_eq!(overlay.details, "Loaded: 3.00 MB");
        assert_eq!(overlay.progress, 0.75);
    }

    #[test]
    fn test_unknown_total_keeps_text() {
        let mut overlay = Overlay::default();
        overlay.show_loading();
        let before = overlay.clone();
        overlay.set_progress(&LoadProgress {
            loaded: 1000,
            total: None,
        });
        assert_eq!(overlay, before);
    }
}
