pub mod cards;
pub mod feed;
pub mod input;
pub mod statusline;
