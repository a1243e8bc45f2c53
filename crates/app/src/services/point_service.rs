//! Point service — use-cases for commanding monitored points.

use std::collections::BTreeMap;
use std::sync::Arc;

use minibac_domain::commandable::Command;
use minibac_domain::error::ProtocolError;
use minibac_domain::id::{ObjectId, ObjectType};
use minibac_domain::point::MonitoredPoint;
use minibac_domain::value::{PointValue, Reliability, WriteValue};

use crate::point_manager::PointManager;
use crate::ports::{PhysicalOutput, SettingsStore};
use crate::reporting::IntrinsicReporting;

/// Application service for priority writes and point configuration.
///
/// Accepted commands drive the physical output (unless the point is out of
/// service) and are persisted through the settings store.
pub struct PointService<O, S> {
    managers: BTreeMap<ObjectType, Arc<PointManager>>,
    output: O,
    store: S,
}

impl<O, S> PointService<O, S>
where
    O: PhysicalOutput,
    S: SettingsStore,
{
    /// Create a new service over the given managers.
    pub fn new(
        managers: impl IntoIterator<Item = Arc<PointManager>>,
        output: O,
        store: S,
    ) -> Self {
        let managers = managers
            .into_iter()
            .map(|manager| (manager.object_type(), manager))
            .collect();
        Self {
            managers,
            output,
            store,
        }
    }

    fn manager(&self, object: ObjectId) -> Result<&PointManager, ProtocolError> {
        self.managers
            .get(&object.object_type)
            .map(|manager| &**manager)
            .filter(|manager| manager.contains(object.instance))
            .ok_or_else(ProtocolError::unknown_object)
    }

    /// Copy of a point's current state.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when the object does not exist.
    pub fn get_point(&self, object: ObjectId) -> Result<MonitoredPoint, ProtocolError> {
        self.manager(object)?
            .snapshot(object.instance)
            .ok_or_else(ProtocolError::unknown_object)
    }

    /// Write `value` at `priority` (1..=16).
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT`, or the rejection of the priority ladder.
    #[tracing::instrument(skip(self))]
    pub async fn write(
        &self,
        object: ObjectId,
        priority: u8,
        value: WriteValue,
    ) -> Result<PointValue, ProtocolError> {
        self.command(object, |point| point.write(priority, value))
            .await
    }

    /// Relinquish `priority` (1..=16).
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT`, or the rejection of the priority ladder.
    #[tracing::instrument(skip(self))]
    pub async fn relinquish(
        &self,
        object: ObjectId,
        priority: u8,
    ) -> Result<PointValue, ProtocolError> {
        self.command(object, |point| point.relinquish(priority))
            .await
    }

    /// Replace the relinquish default.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT`, `INVALID_DATA_TYPE` or `VALUE_OUT_OF_RANGE`.
    #[tracing::instrument(skip(self))]
    pub async fn set_relinquish_default(
        &self,
        object: ObjectId,
        value: PointValue,
    ) -> Result<PointValue, ProtocolError> {
        let present = self
            .command(object, |point| point.set_relinquish_default(value))
            .await?;
        super::persist(&self.store, &format!("{object}/relinquish-default"), &value).await;
        Ok(present)
    }

    /// Take the point in or out of service.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when the object does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn set_out_of_service(
        &self,
        object: ObjectId,
        value: bool,
    ) -> Result<(), ProtocolError> {
        self.manager(object)?
            .with_point(object.instance, |point| point.set_out_of_service(value))?;
        super::persist(&self.store, &format!("{object}/out-of-service"), &value).await;
        Ok(())
    }

    /// Update the reliability reported by the point's input side.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when the object does not exist.
    #[tracing::instrument(skip(self))]
    pub fn set_reliability(
        &self,
        object: ObjectId,
        reliability: Reliability,
    ) -> Result<(), ProtocolError> {
        self.manager(object)?
            .with_point(object.instance, |point| point.set_reliability(reliability))
    }

    async fn command(
        &self,
        object: ObjectId,
        mutate: impl FnOnce(&mut MonitoredPoint) -> Result<Command, ProtocolError>,
    ) -> Result<PointValue, ProtocolError> {
        let (command, priority_array) = self.manager(object)?.with_point(object.instance, |point| {
            mutate(point).map(|command| (command, *point.point().priority_array()))
        })??;

        if command.actuate {
            self.output.apply(object, command.old, command.new).await;
        } else {
            tracing::debug!(%object, "out of service, physical output skipped");
        }
        super::persist(&self.store, &format!("{object}/priority-array"), &priority_array).await;
        Ok(command.new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use minibac_domain::error::ErrorCode;
    use minibac_domain::value::BinaryPv;
    use std::sync::Mutex;

    #[derive(Default)]
    struct SpyOutput {
        applied: Mutex<Vec<(ObjectId, PointValue, PointValue)>>,
    }

    impl PhysicalOutput for SpyOutput {
        async fn apply(&self, object: ObjectId, old: PointValue, new: PointValue) {
            self.applied.lock().unwrap().push((object, old, new));
        }
    }

    #[derive(Default)]
    struct InMemoryStore {
        saved: Mutex<Vec<(String, serde_json::Value)>>,
        failing: bool,
    }

    impl SettingsStore for InMemoryStore {
        async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
            if self.failing {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.saved.lock().unwrap().push((key.to_string(), value));
            Ok(())
        }
    }

    const BO1: ObjectId = ObjectId::new(ObjectType::BinaryOutput, 1);
    const ACTIVE: PointValue = PointValue::Binary(BinaryPv::Active);
    const INACTIVE: PointValue = PointValue::Binary(BinaryPv::Inactive);

    fn make_service_with(store: InMemoryStore) -> PointService<SpyOutput, InMemoryStore> {
        let mut manager = PointManager::new(ObjectType::BinaryOutput);
        manager
            .insert(
                MonitoredPoint::builder(BO1)
                    .name("Supply fan")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        PointService::new([Arc::new(manager)], SpyOutput::default(), store)
    }

    fn make_service() -> PointService<SpyOutput, InMemoryStore> {
        make_service_with(InMemoryStore::default())
    }

    #[tokio::test]
    async fn should_apply_output_and_persist_when_write_succeeds() {
        let svc = make_service();

        let present = svc.write(BO1, 8, ACTIVE.into()).await.unwrap();

        assert_eq!(present, ACTIVE);
        assert_eq!(*svc.output.applied.lock().unwrap(), vec![(BO1, INACTIVE, ACTIVE)]);
        let saved = svc.store.saved.lock().unwrap();
        assert_eq!(saved[0].0, "binary-output:1/priority-array");
        assert_eq!(saved[0].1[7], serde_json::json!({ "kind": "binary", "value": "active" }));
    }

    #[tokio::test]
    async fn should_apply_output_even_when_value_is_unchanged() {
        let svc = make_service();
        svc.write(BO1, 8, ACTIVE.into()).await.unwrap();
        svc.write(BO1, 10, INACTIVE.into()).await.unwrap();

        let applied = svc.output.applied.lock().unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1], (BO1, ACTIVE, ACTIVE));
    }

    #[tokio::test]
    async fn should_skip_output_when_out_of_service() {
        let svc = make_service();
        svc.set_out_of_service(BO1, true).await.unwrap();

        let present = svc.write(BO1, 8, ACTIVE.into()).await.unwrap();

        assert_eq!(present, ACTIVE);
        assert!(svc.output.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_reserved_priority_without_side_effects() {
        let svc = make_service();

        let err = svc.write(BO1, 6, ACTIVE.into()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::WriteAccessDenied);
        assert!(svc.output.applied.lock().unwrap().is_empty());
        assert!(svc.store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_unknown_object() {
        let svc = make_service();
        let err = svc
            .write(ObjectId::new(ObjectType::BinaryOutput, 2), 8, ACTIVE.into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownObject);

        let err = svc
            .relinquish(ObjectId::new(ObjectType::MultiStateValue, 1), 8)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownObject);
    }

    #[tokio::test]
    async fn should_fall_back_to_default_when_relinquished() {
        let svc = make_service();
        svc.write(BO1, 8, ACTIVE.into()).await.unwrap();

        let present = svc.relinquish(BO1, 8).await.unwrap();

        assert_eq!(present, INACTIVE);
        assert_eq!(svc.get_point(BO1).unwrap().present_value(), INACTIVE);
    }

    #[tokio::test]
    async fn should_keep_write_when_persistence_fails() {
        let svc = make_service_with(InMemoryStore {
            failing: true,
            ..InMemoryStore::default()
        });

        let present = svc.write(BO1, 8, ACTIVE.into()).await.unwrap();

        assert_eq!(present, ACTIVE);
        assert_eq!(svc.get_point(BO1).unwrap().present_value(), ACTIVE);
    }
}
