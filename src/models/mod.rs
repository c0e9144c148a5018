pub mod comment;
pub mod session;
pub mod topic;
pub mod user;

pub use comment::{Entity as Comment, Model as CommentModel};
pub use session::{Entity as Session, Model as SessionModel};
pub use topic::{Entity as Topic, Model as TopicModel};
pub use user::{Entity as User, Level, Model as UserModel};
