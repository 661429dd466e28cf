mod misc;

pub use misc::misc_routes;
