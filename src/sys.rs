//! Interfaces to the display server side of the window manager.

pub mod display;
