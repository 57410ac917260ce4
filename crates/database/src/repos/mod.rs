//! Database repository implementations

pub mod conversation_repository;
pub mod member_repository;
pub mod message_repository;
pub mod user_repository;

pub use conversation_repository::ConversationRepository;
pub use member_repository::MemberRepository;
pub use message_repository::{
    clamp_limit, MessageRepository, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use user_repository::UserRepository;
