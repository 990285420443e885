use windows_sys::Win32::System::Threading::GetCurrentThreadStackLimits;

use crate::bounds::StackBounds;
use crate::fatal::{AttrFailure, FailureCause};
use super::StackQuery;

/// Windows reports the reserved stack region directly, no attribute object needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsQuery;

impl StackQuery for WindowsQuery {
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
        let (mut low, mut high) = (0usize, 0usize);
        
        // SAFETY: both out params are plain writable words
        unsafe { GetCurrentThreadStackLimits(&raw mut low, &raw mut high) };
        
        match StackBounds::from_limits(low, high) {
            Some(bounds) => Ok(Some(bounds)),
            None => Err(AttrFailure { op: "GetCurrentThreadStackLimits", cause: FailureCause::Inverted { low, high } }),
        }
    }
}
