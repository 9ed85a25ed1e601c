use std::time::{Duration, Instant};
use winit::window::Window;

const TITLE_REFRESH: Duration = Duration::from_millis(500);

/// Frame cadence bookkeeping plus the fps readout in the window title.
pub struct FrameTiming {
    last_title_time: Instant,
    frames_since_title: u32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_title_time: Instant::now(),
            frames_since_title: 0,
            base_title,
        }
    }

    /// Counts a frame; every half second rewrites the title with `status` and the fps.
    pub fn update(&mut self, window: &Window, now: Instant, status: &str) {
        self.frames_since_title = self.frames_since_title.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_title_time);
        if elapsed < TITLE_REFRESH {
            return;
        }
        let fps = self.frames_since_title as f32 / elapsed.as_secs_f32();
        window.set_title(&title(&self.base_title, status, fps));
        self.frames_since_title = 0;
        self.last_title_time = now;
    }
}

fn title(base: &str, status: &str, fps: f32) -> String {
    if status.is_empty() {
        format!("{} - {:.0} fps", base, fps)
    } else {
        format!("{} - {} - {:.0} fps", base, status, fps)
    }
}

/// Frame interval matching the monitor refresh rate, 60 Hz when unknown.
pub fn target_frame_duration(window: &Window) -> Duration {
    window
        .current_monitor()
        .and_then(|monitor| monitor.refresh_rate_millihertz())
        .map(|millihz| millihz as f32 / 1000.0)
        .filter(|hz| *hz > 1.0)
        .map(|hz| Duration::from_secs_f32(1.0 / hz))
        .unwrap_or(Duration::from_millis(16))
}

#[cfg(test)]
mod tests {
    use super::title;

    #[test]
    fn title_includes_status_when_present() {
        assert_eq!(title("Shadelab", "", 59.6), "Shadelab - 60 fps");
        assert_eq!(title("Shadelab", "Torus", 30.0), "Shadelab - Torus - 30 fps");
    }
}
