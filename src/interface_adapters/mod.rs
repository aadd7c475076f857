// Interface adapters: HTTP routes, push channel, wire protocol and outbound clients.

pub mod clients;
pub mod handlers;
pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
