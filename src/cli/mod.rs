mod preview;

pub use preview::preview;
