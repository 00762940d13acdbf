mod user;

pub use user::TravelUser;
