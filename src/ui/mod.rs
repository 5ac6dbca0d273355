// UI module - GUI logic and event loop bridge
//
// This module contains:
// - EventLoopBridge: Coordinates between tokio async runtime and Slint event loop
// - GuiController: Wires the UI to state, map, and backend services
// - cards: Plain-text formatting for result cards and action URIs

pub mod bridge;
pub mod cards;
pub mod controller;

pub use bridge::EventLoopBridge;
pub use controller::GuiController;
