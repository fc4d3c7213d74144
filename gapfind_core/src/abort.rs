/*!
# Gap Find: Kill Switch
*/

use std::sync::{
	Arc,
	atomic::{
		AtomicBool,
		Ordering::Acquire,
	},
};



#[derive(Debug, Clone, Copy)]
/// # Kill Switch.
///
/// The main program's CTRL-C intercept sets the value, letting a dump stop
/// between sectors (or tracks) and still report what it managed to resolve.
pub struct KillSwitch(&'static Arc<AtomicBool>);

impl From<&'static Arc<AtomicBool>> for KillSwitch {
	#[inline]
	fn from(src: &'static Arc<AtomicBool>) -> Self { Self(src) }
}

impl KillSwitch {
	#[must_use]
	/// # Dead?
	pub fn killed(&self) -> bool { self.0.load(Acquire) }
}
