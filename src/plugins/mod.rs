pub mod registry;
pub mod spotdl;
pub mod ytdlp;
