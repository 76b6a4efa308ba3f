pub mod osf_server;
