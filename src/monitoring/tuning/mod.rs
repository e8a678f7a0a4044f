/*!
 * Runtime Tuning
 * Control loops fed by collector observers
 */

mod baseline;
mod error_rate;
mod tuner;
mod window;

pub use baseline::RuntimeBaseline;
pub use error_rate::ErrorRateObserver;
pub use tuner::RuntimeTuner;
pub use window::RollingWindow;
