pub mod camera;
pub mod centerline;
pub mod collision;
pub mod lights;
pub mod round;
pub mod track;
pub mod track_format;
pub mod vehicle;
