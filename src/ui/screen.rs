use std::io;

use ratatui::{backend::Backend, Terminal};

/// What the participant currently sees
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Instructions(String),
    Blank,
    FirstWord { word: String, opacity: f64 },
    SecondWord { word: String, opacity: f64 },
    Message(String),
}

/// A presentation surface boundary: draws screens and reports its size in cells
pub trait Surface {
    fn present(&mut self, screen: &Screen) -> io::Result<()>;
    fn size(&self) -> (u16, u16);
}

/// Surface backed by a ratatui terminal (crossterm in production, TestBackend in tests)
pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    size: (u16, u16),
}

impl<B: Backend> TerminalSurface<B> {
    pub fn new(terminal: Terminal<B>) -> io::Result<Self> {
        let area = terminal.size()?;
        Ok(Self {
            terminal,
            size: (area.width, area.height),
        })
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Surface for TerminalSurface<B> {
    fn present(&mut self, screen: &Screen) -> io::Result<()> {
        let frame = self.terminal.draw(|f| f.render_widget(screen, f.area()))?;
        self.size = (frame.area.width, frame.area.height);
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }
}

/// Headless surface that keeps every presented screen
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    frames: Vec<Screen>,
    size: (u16, u16),
}

impl RecordingSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            frames: Vec::new(),
            size: (width, height),
        }
    }

    pub fn frames(&self) -> &[Screen] {
        &self.frames
    }
}

impl Surface for RecordingSurface {
    fn present(&mut self, screen: &Screen) -> io::Result<()> {
        self.frames.push(screen.clone());
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn buffer_text(surface: &TerminalSurface<TestBackend>) -> String {
        surface
            .terminal()
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_terminal_surface_renders_words() {
        let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let mut surface = TerminalSurface::new(terminal).unwrap();
        assert_eq!(surface.size(), (60, 12));

        surface
            .present(&Screen::FirstWord {
                word: "cat".into(),
                opacity: 1.0,
            })
            .unwrap();
        let content = buffer_text(&surface);
        assert!(content.contains("First word:"));
        assert!(content.contains("cat"));

        surface
            .present(&Screen::SecondWord {
                word: "feline".into(),
                opacity: 0.5,
            })
            .unwrap();
        let content = buffer_text(&surface);
        assert!(content.contains("Second word:"));
        assert!(content.contains("feline"));
        assert!(!content.contains("cat"));
    }

    #[test]
    fn test_blank_screen_is_empty() {
        let terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        let mut surface = TerminalSurface::new(terminal).unwrap();
        surface.present(&Screen::Message("hello".into())).unwrap();
        surface.present(&Screen::Blank).unwrap();
        assert!(buffer_text(&surface).trim().is_empty());
    }

    #[test]
    fn test_recording_surface_keeps_order() {
        let mut surface = RecordingSurface::new(80, 24);
        surface.present(&Screen::Blank).unwrap();
        surface.present(&Screen::Message("done".into())).unwrap();
        assert_eq!(
            surface.frames(),
            &[Screen::Blank, Screen::Message("done".into())]
        );
    }
}
