// src/hook/workflow.rs

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::Result;
use crate::lineage::CreateJob;
use crate::schedule::{self, ExecutionWindow, ScheduleSpec};

/// What the hook needs to know about one workflow to report its runs.
///
/// Built from a `[workflow.<id>]` section at startup; the schedule is already
/// parsed, so window computation cannot fail on syntax later.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDefinition {
    pub id: String,
    pub schedule: ScheduleSpec,
    /// Zone the schedule is evaluated in; `None` keeps the nominal time's own
    /// offset.
    pub timezone: Option<Tz>,
    pub location: Option<String>,
    pub input_urns: Vec<String>,
    pub output_urns: Vec<String>,
    pub description: Option<String>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, schedule: ScheduleSpec) -> Self {
        Self {
            id: id.into(),
            schedule,
            timezone: None,
            location: None,
            input_urns: Vec::new(),
            output_urns: Vec::new(),
            description: None,
        }
    }

    pub fn with_timezone(mut self, zone: Tz) -> Self {
        self.timezone = Some(zone);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, urns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_urns = urns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, S>(mut self, urns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_urns = urns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Window of the run nominally at `nominal_time`, evaluated in the
    /// workflow's timezone when it has one.
    pub fn window_for<Z: TimeZone>(
        &self,
        nominal_time: &DateTime<Z>,
    ) -> Result<ExecutionWindow<Utc>> {
        let window = match self.timezone {
            Some(zone) => {
                schedule::compute(&self.schedule, &nominal_time.with_timezone(&zone))?.to_utc()
            }
            None => schedule::compute(&self.schedule, nominal_time)?.to_utc(),
        };
        Ok(window)
    }

    /// Job registration for this workflow. The job is named after the
    /// workflow id.
    pub fn to_create_job(&self) -> CreateJob {
        CreateJob {
            job_name: self.id.clone(),
            location: self.location.clone(),
            input_urns: self.input_urns.clone(),
            output_urns: self.output_urns.clone(),
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn window_follows_the_workflow_timezone() {
        let workflow = WorkflowDefinition::new("etl", ScheduleSpec::parse("0 0 * * *").unwrap())
            .with_timezone(chrono_tz::Europe::Berlin);

        // Midnight in Berlin, the night before clocks go back.
        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        let nominal = cest.with_ymd_and_hms(2019, 10, 26, 0, 0, 0).unwrap();

        let window = workflow.window_for(&nominal).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2019, 10, 25, 22, 0, 0).unwrap());
        assert_eq!(window.end, Some(Utc.with_ymd_and_hms(2019, 10, 26, 22, 0, 0).unwrap()));

        let next = workflow.window_for(&window.end.unwrap()).unwrap();
        // 25 hours: the next midnight is in CET.
        assert_eq!(next.end, Some(Utc.with_ymd_and_hms(2019, 10, 27, 23, 0, 0).unwrap()));
    }

    #[test]
    fn without_a_timezone_the_offset_is_kept() {
        let workflow = WorkflowDefinition::new("etl", ScheduleSpec::parse("0 0 * * *").unwrap());
        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        let nominal = cest.with_ymd_and_hms(2019, 10, 27, 0, 0, 0).unwrap();

        let window = workflow.window_for(&nominal).unwrap();
        // Fixed +02:00 midnight, one hour off Berlin's CET midnight.
        assert_eq!(window.end, Some(Utc.with_ymd_and_hms(2019, 10, 27, 22, 0, 0).unwrap()));
    }
}
