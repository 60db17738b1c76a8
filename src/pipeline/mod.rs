pub mod autocapture;
pub mod capture_loop;
pub mod session;

pub use autocapture::AutoCapture;
pub use capture_loop::CaptureLoopHandle;
pub use session::SessionController;
