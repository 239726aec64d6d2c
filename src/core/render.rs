/// Drawing surfaces. Renderers only see the `Surface` trait; `DrawList`
/// records commands for hosts that paint elsewhere (the browser canvas,
/// tests).

use serde::Serialize;

pub trait Surface {
    fn size(&self) -> (f64, f64);
    fn clear(&mut self, color: &str);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str);
    fn stroke_circle(&mut self, x: f64, y: f64, radius: f64, width: f64, color: &str);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: &str);
    fn text(&mut self, x: f64, y: f64, text: &str, size: f64, color: &str);
    /// Global alpha for subsequent commands, clamped to 0.0..=1.0.
    fn set_alpha(&mut self, alpha: f64);
}

/// Hands out the drawing surface for a frame, if one exists right now.
pub trait SurfaceHost {
    fn acquire(&mut self) -> Option<&mut dyn Surface>;
}

/// `None` models a canvas whose context could not be obtained.
impl<S: Surface> SurfaceHost for Option<S> {
    fn acquire(&mut self) -> Option<&mut dyn Surface> {
        self.as_mut().map(|s| s as &mut dyn Surface)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        color: String,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: String,
    },
    Circle {
        x: f64,
        y: f64,
        r: f64,
        color: String,
    },
    Ring {
        x: f64,
        y: f64,
        r: f64,
        width: f64,
        color: String,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        color: String,
    },
    Alpha {
        alpha: f64,
    },
}

/// A surface that records what was drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawList {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Hand over the recorded frame and start a fresh one.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for DrawList {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: &str) {
        // A clear makes everything before it invisible.
        self.commands.clear();
        self.commands.push(DrawCommand::Clear {
            color: color.to_string(),
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            w,
            h,
            color: color.to_string(),
        });
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str) {
        self.commands.push(DrawCommand::Circle {
            x,
            y,
            r: radius,
            color: color.to_string(),
        });
    }

    fn stroke_circle(&mut self, x: f64, y: f64, radius: f64, width: f64, color: &str) {
        self.commands.push(DrawCommand::Ring {
            x,
            y,
            r: radius,
            width,
            color: color.to_string(),
        });
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: &str) {
        self.commands.push(DrawCommand::Line {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            width,
            color: color.to_string(),
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: f64, color: &str) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            size,
            color: color.to_string(),
        });
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCommand::Alpha {
            alpha: alpha.clamp(0.0, 1.0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_discards_earlier_commands() {
        let mut list = DrawList::new(100.0, 50.0);
        list.fill_circle(1.0, 1.0, 2.0, "red");
        list.clear("black");
        list.fill_rect(0.0, 0.0, 5.0, 5.0, "blue");
        assert_eq!(list.commands.len(), 2);
        assert!(matches!(list.commands[0], DrawCommand::Clear { .. }));
    }

    #[test]
    fn missing_surface_yields_none() {
        let mut host: Option<DrawList> = None;
        assert!(host.acquire().is_none());
        let mut host = Some(DrawList::new(10.0, 10.0));
        let surface = host.acquire().unwrap();
        assert_eq!(surface.size(), (10.0, 10.0));
    }

    #[test]
    fn alpha_is_clamped() {
        let mut list = DrawList::new(1.0, 1.0);
        list.set_alpha(3.0);
        assert_eq!(list.commands[0], DrawCommand::Alpha { alpha: 1.0 });
    }
}
