//! Physical output port — drives the hardware behind a commandable point.

use std::future::Future;

use minibac_domain::id::ObjectId;
use minibac_domain::value::PointValue;

/// Applies a resolved value change to the physical world.
///
/// Called after every accepted write or relinquish while the point is in
/// service, even when the resolved value did not change.
pub trait PhysicalOutput {
    fn apply(
        &self,
        object: ObjectId,
        old: PointValue,
        new: PointValue,
    ) -> impl Future<Output = ()> + Send;
}

impl<T: PhysicalOutput + Send + Sync> PhysicalOutput for std::sync::Arc<T> {
    fn apply(
        &self,
        object: ObjectId,
        old: PointValue,
        new: PointValue,
    ) -> impl Future<Output = ()> + Send {
        (**self).apply(object, old, new)
    }
}
