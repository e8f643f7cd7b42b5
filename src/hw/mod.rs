pub mod adc;
pub mod led;
pub mod pwm;
pub mod time;
pub mod usart;

pub use adc::PressureSensor;
pub use led::StatusLed;
pub use pwm::PwmBank;
pub use time::MicrosTimer;
pub use usart::Usart;
