//! Alarm service — device-wide event information, alarm summary and
//! acknowledgment routing over the object table.

use std::sync::Arc;

use minibac_domain::ack::{AckOutcome, AckRequest};
use minibac_domain::error::{AckError, ProtocolError};
use minibac_domain::id::ObjectId;
use minibac_domain::summary::{AlarmSummary, EventInformation, Slot};

use crate::registry::NotificationClassRegistry;
use crate::reporting::{IntrinsicReporting, ObjectTable};

/// Application service answering alarm and event queries.
pub struct AlarmService {
    table: ObjectTable,
    registry: Arc<NotificationClassRegistry>,
}

impl AlarmService {
    pub fn new(table: ObjectTable, registry: Arc<NotificationClassRegistry>) -> Self {
        Self { table, registry }
    }

    /// One page of active events in ascending object order, starting after
    /// `last_received`.
    ///
    /// At most `max` summaries are returned; `max == 0` means no limit.
    /// `more_events` is set when another active event follows the page.
    #[must_use]
    pub fn get_event_information(
        &self,
        last_received: Option<ObjectId>,
        max: usize,
    ) -> EventInformation {
        let limit = if max == 0 { usize::MAX } else { max };
        let mut info = EventInformation::default();

        for reporter in self.table.iter() {
            for index in 0.. {
                let summary = match reporter.event_information(index, &self.registry) {
                    Slot::EndOfList => break,
                    Slot::Inactive => continue,
                    Slot::Active(summary) => summary,
                };
                if last_received.is_some_and(|last| summary.object <= last) {
                    continue;
                }
                if info.summaries.len() == limit {
                    info.more_events = true;
                    return info;
                }
                info.summaries.push(summary);
            }
        }
        info
    }

    /// Every object in an active alarm state, in ascending object order.
    #[must_use]
    pub fn get_alarm_summary(&self) -> Vec<AlarmSummary> {
        self.table
            .iter()
            .flat_map(alarm_summaries)
            .collect()
    }

    /// Route an acknowledgment to the object it names.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when no reporting object matches, otherwise the
    /// object's acknowledgment errors.
    #[tracing::instrument(
        skip(self, request),
        fields(object = %request.event_object, state = %request.event_state_acked)
    )]
    pub fn alarm_ack(&self, request: &AckRequest) -> Result<AckOutcome, AckError> {
        let object = request.event_object;
        let reporter = self
            .table
            .find(object.object_type)
            .ok_or_else(ProtocolError::unknown_object)?;
        let outcome = reporter.alarm_ack(object.instance, request);
        match &outcome {
            Ok(AckOutcome::Acknowledged) => {
                tracing::info!(source = %request.source, "transition acknowledged");
            }
            Ok(AckOutcome::AlreadyAcknowledged) => {
                tracing::debug!("transition already acknowledged");
            }
            Err(err) => tracing::debug!(error = %err, "acknowledgment rejected"),
        }
        outcome
    }
}

fn alarm_summaries(reporter: &dyn IntrinsicReporting) -> impl Iterator<Item = AlarmSummary> + '_ {
    (0..)
        .map(|index| reporter.alarm_summary(index))
        .take_while(|slot| !slot.is_end())
        .filter_map(Slot::active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_manager::PointManager;
    use chrono::NaiveDate;
    use minibac_domain::error::ErrorCode;
    use minibac_domain::event_state::{EventState, NotifyType, Transition, TransitionBits};
    use minibac_domain::id::ObjectType;
    use minibac_domain::monitor::ReportingConfig;
    use minibac_domain::notification_class::NotificationClass;
    use minibac_domain::point::{AlarmCondition, MonitoredPoint};
    use minibac_domain::time::{EventTimeStamp, Timestamp};
    use minibac_domain::value::{BinaryPv, PointValue, WriteValue};

    fn at(second: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(14, 0, second)
            .unwrap()
    }

    fn binary(object_type: ObjectType, instance: u32, notify_type: NotifyType) -> MonitoredPoint {
        MonitoredPoint::builder(ObjectId::new(object_type, instance))
            .name(format!("{object_type} {instance}"))
            .notification_class(1)
            .reporting(ReportingConfig {
                notify_type,
                ..ReportingConfig::default()
            })
            .build()
            .unwrap()
    }

    fn multi_state(instance: u32) -> MonitoredPoint {
        MonitoredPoint::builder(ObjectId::new(ObjectType::MultiStateValue, instance))
            .name("Mode")
            .notification_class(1)
            .number_of_states(3)
            .alarm(AlarmCondition::MultiState {
                alarm_values: vec![3],
                fault_values: Vec::new(),
            })
            .build()
            .unwrap()
    }

    /// BV1 (event), BV2 (alarm), BO5 (alarm), MSV1 (alarm), all off-normal.
    fn setup() -> (AlarmService, Vec<Arc<PointManager>>) {
        let mut bo = PointManager::new(ObjectType::BinaryOutput);
        bo.insert(binary(ObjectType::BinaryOutput, 5, NotifyType::Alarm))
            .unwrap();
        let mut bv = PointManager::new(ObjectType::BinaryValue);
        bv.insert(binary(ObjectType::BinaryValue, 2, NotifyType::Alarm))
            .unwrap();
        bv.insert(binary(ObjectType::BinaryValue, 1, NotifyType::Event))
            .unwrap();
        let mut msv = PointManager::new(ObjectType::MultiStateValue);
        msv.insert(multi_state(1)).unwrap();

        let registry = Arc::new(NotificationClassRegistry::new());
        registry.insert(
            NotificationClass::new(1)
                .with_ack_required(TransitionBits::NONE.with(Transition::ToOffnormal, true)),
        );

        let managers = vec![Arc::new(msv), Arc::new(bv), Arc::new(bo)];
        for manager in &managers {
            for index in 0..manager.len() {
                let object = manager.object_id(index).unwrap();
                let value = if object.object_type.is_binary() {
                    PointValue::Binary(BinaryPv::Active)
                } else {
                    PointValue::MultiState(3)
                };
                manager
                    .with_point(object.instance, |point| {
                        point.write(8, WriteValue::Value(value)).unwrap()
                    })
                    .unwrap();
            }
            manager.tick(&registry, at(1));
        }

        let table = ObjectTable::new(
            managers
                .iter()
                .map(|manager| Arc::clone(manager) as Arc<dyn IntrinsicReporting>)
                .collect(),
        );
        (AlarmService::new(table, registry), managers)
    }

    fn ack(object: ObjectId, state: EventState, ts: Timestamp) -> AckRequest {
        AckRequest {
            acknowledging_process_id: 7,
            event_object: object,
            event_state_acked: state,
            timestamp: EventTimeStamp::DateTime(ts),
            source: "front desk".to_string(),
            time_of_ack: EventTimeStamp::DateTime(at(30)),
        }
    }

    fn objects(info: &EventInformation) -> Vec<ObjectId> {
        info.summaries.iter().map(|s| s.object).collect()
    }

    #[test]
    fn should_list_active_events_in_object_order() {
        let (svc, _) = setup();

        let info = svc.get_event_information(None, 0);

        assert_eq!(
            objects(&info),
            vec![
                ObjectId::new(ObjectType::BinaryOutput, 5),
                ObjectId::new(ObjectType::BinaryValue, 1),
                ObjectId::new(ObjectType::BinaryValue, 2),
                ObjectId::new(ObjectType::MultiStateValue, 1),
            ]
        );
        assert!(!info.more_events);
    }

    #[test]
    fn should_page_event_information_after_last_received() {
        let (svc, _) = setup();

        let first = svc.get_event_information(None, 2);
        assert_eq!(first.summaries.len(), 2);
        assert!(first.more_events);

        let last = first.summaries[1].object;
        let second = svc.get_event_information(Some(last), 2);
        assert_eq!(
            objects(&second),
            vec![
                ObjectId::new(ObjectType::BinaryValue, 2),
                ObjectId::new(ObjectType::MultiStateValue, 1),
            ]
        );
        assert!(!second.more_events);
    }

    #[test]
    fn should_summarize_only_alarm_notify_type() {
        let (svc, _) = setup();

        let alarms: Vec<ObjectId> = svc.get_alarm_summary().iter().map(|a| a.object).collect();

        assert_eq!(
            alarms,
            vec![
                ObjectId::new(ObjectType::BinaryOutput, 5),
                ObjectId::new(ObjectType::BinaryValue, 2),
                ObjectId::new(ObjectType::MultiStateValue, 1),
            ]
        );
    }

    #[test]
    fn should_route_ack_to_owning_object_type() {
        let (svc, _) = setup();
        let object = ObjectId::new(ObjectType::MultiStateValue, 1);

        let outcome = svc.alarm_ack(&ack(object, EventState::Offnormal, at(1))).unwrap();

        assert_eq!(outcome, AckOutcome::Acknowledged);
        let info = svc.get_event_information(None, 0);
        let summary = info.summaries.iter().find(|s| s.object == object).unwrap();
        assert!(summary.acked_transitions.contains(Transition::ToOffnormal));
    }

    #[test]
    fn should_reject_stale_ack_timestamp() {
        let (svc, _) = setup();
        let object = ObjectId::new(ObjectType::BinaryValue, 2);

        let err = svc
            .alarm_ack(&ack(object, EventState::Offnormal, at(0)))
            .unwrap_err();

        assert_eq!(
            err,
            AckError::Rejected(ProtocolError::invalid_time_stamp())
        );
    }

    #[test]
    fn should_reject_ack_for_type_without_reporting() {
        let (svc, _) = setup();
        let object = ObjectId::new(ObjectType::MultiStateOutput, 1);

        let err = svc
            .alarm_ack(&ack(object, EventState::Offnormal, at(1)))
            .unwrap_err();

        assert!(matches!(
            err,
            AckError::Rejected(ProtocolError {
                code: ErrorCode::UnknownObject,
                ..
            })
        ));
    }

    #[test]
    fn should_drop_event_once_normal_and_acked() {
        let (svc, managers) = setup();
        let bo = &managers[2];
        let object = ObjectId::new(ObjectType::BinaryOutput, 5);
        bo.with_point(5, |point| point.relinquish(8).unwrap()).unwrap();
        bo.tick(&svc.registry, at(2));

        svc.alarm_ack(&ack(object, EventState::Offnormal, at(1)))
            .unwrap();

        let info = svc.get_event_information(None, 0);
        assert!(!objects(&info).contains(&object));
    }
}
