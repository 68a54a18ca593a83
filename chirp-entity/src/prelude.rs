pub use super::follow::Entity as Follow;
pub use super::like::Entity as Like;
pub use super::tweet::Entity as Tweet;
pub use super::user::Entity as User;
