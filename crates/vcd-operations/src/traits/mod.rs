mod gateway;

pub use gateway::RemoteEntityGateway;
