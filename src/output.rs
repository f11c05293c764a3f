use anyhow::{anyhow, Result};

/// Where annotated frames end up.
pub trait FrameSink {
    fn is_open(&self) -> bool;
    /// The user asked to quit (Escape).
    fn exit_requested(&self) -> bool;
    /// Present a packed RGB8 frame.
    fn show(&mut self, rgb: &[u8], width: usize, height: usize) -> Result<()>;
}

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("Failed to create window: {}", e))?;

        // ~60 FPS; also paces key polling
        window.set_target_fps(60);

        Ok(Self {
            window,
            buffer: vec![0; width * height],
        })
    }
}

/// RGB8 -> 0RGB u32, as minifb expects.
fn pack_rgb(rgb: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgb.chunks_exact(3)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32),
    );
}

impl FrameSink for WindowOutput {
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn exit_requested(&self) -> bool {
        self.window.is_key_down(minifb::Key::Escape)
    }

    fn show(&mut self, rgb: &[u8], width: usize, height: usize) -> Result<()> {
        pack_rgb(rgb, &mut self.buffer);
        self.buffer.resize(width * height, 0);
        self.window
            .update_with_buffer(&self.buffer, width, height)
            .map_err(|e| anyhow!("Window update failed: {}", e))
    }
}
