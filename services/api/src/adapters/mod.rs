pub mod chat_llm;
pub mod fs_store;
pub mod sst;
pub mod tts;

pub use chat_llm::OpenAiChatAdapter;
pub use fs_store::JsonFileStore;
pub use sst::OpenAiSstAdapter;
pub use tts::OpenAiTtsAdapter;
