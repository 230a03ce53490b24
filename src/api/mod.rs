pub mod bootstrap;
pub mod connections;
pub mod protocol;
pub mod server;
pub mod session;

pub use bootstrap::{build_agent, build_agent_with, greeting_message, serve, BootstrapError};
pub use connections::{ConnectionRegistry, SessionInfo};
pub use protocol::{InboundMessage, OutboundKind, OutboundMessage, ProtocolError};
pub use server::SessionServer;
pub use session::{run_session, DialogueHandler, GreetingHook, SessionContext, SessionError, SessionState};
