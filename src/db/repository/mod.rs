pub mod item;
pub mod list;
pub mod membership;
pub mod session;
pub mod share_link;
pub mod user;

pub use item::ItemRepository;
pub use list::ListRepository;
pub use membership::MembershipRepository;
pub use session::SessionRepository;
pub use share_link::ShareLinkRepository;
pub use user::UserRepository;
