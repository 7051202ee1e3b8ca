//! Web 服务器模块
//! 绑定端口、后台运行与优雅关闭

pub mod server;

pub use server::{serve, shutdown_signal, WebServer, SHUTDOWN_TIMEOUT};
