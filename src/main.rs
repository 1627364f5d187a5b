//! Maquette - a desktop 3D scene editor for architectural visualization.
//!
//! A winit/egui shell over a retained wgpu renderer: UI panels edit a
//! central scene store, the renderer mirrors the store every frame, and
//! projects persist wholesale to a JSON-backed store. A small assistant
//! module turns a written lighting description into scene lighting via a
//! hosted language model.

mod ai;
mod app;
mod project;
mod render;
mod scene;
mod ui;

fn main() {
    app::run();
}
