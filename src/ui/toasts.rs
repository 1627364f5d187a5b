//! Transient notifications, stacked in the bottom-right corner.

use std::time::{Duration, Instant};

const TOAST_TTL: Duration = Duration::from_secs(4);
const MAX_TOASTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    created: Instant,
}

#[derive(Debug, Default)]
pub struct ToastStack {
    toasts: Vec<Toast>,
}

impl ToastStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            ToastKind::Error => log::warn!("{}", message),
            _ => log::info!("{}", message),
        }
        self.toasts.push(Toast {
            message,
            kind,
            created: Instant::now(),
        });
        if self.toasts.len() > MAX_TOASTS {
            let overflow = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..overflow);
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message);
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    fn prune(&mut self, ttl: Duration) {
        let now = Instant::now();
        self.toasts
            .retain(|toast| now.duration_since(toast.created) < ttl);
    }

    pub fn draw(&mut self, ctx: &egui::Context) {
        self.prune(TOAST_TTL);
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.toasts.iter().rev() {
                    let (fill, text) = match toast.kind {
                        ToastKind::Info => {
                            (egui::Color32::from_rgb(45, 55, 72), egui::Color32::WHITE)
                        }
                        ToastKind::Success => {
                            (egui::Color32::from_rgb(34, 84, 61), egui::Color32::WHITE)
                        }
                        ToastKind::Error => {
                            (egui::Color32::from_rgb(116, 42, 42), egui::Color32::WHITE)
                        }
                    };
                    egui::Frame::popup(ui.style())
                        .fill(fill)
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(&toast.message).color(text));
                        });
                    ui.add_space(4.0);
                }
            });
        // Keep repainting while toasts are on screen so they expire
        // without needing another input event.
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_is_bounded() {
        let mut stack = ToastStack::new();
        for index in 0..20 {
            stack.info(format!("toast {}", index));
        }
        assert_eq!(stack.len(), MAX_TOASTS);
    }

    #[test]
    fn prune_drops_expired_toasts() {
        let mut stack = ToastStack::new();
        stack.info("short lived");
        std::thread::sleep(Duration::from_millis(2));
        stack.prune(Duration::from_millis(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn fresh_toasts_survive_prune() {
        let mut stack = ToastStack::new();
        stack.error("still here");
        stack.prune(Duration::from_secs(10));
        assert_eq!(stack.len(), 1);
    }
}
