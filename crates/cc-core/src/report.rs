//! Slack-formatted report rendering.

use crate::evaluator::default_max_age;
use crate::models::MatchedInstance;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Renders discovered stale clusters for one environment.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    max_age: Duration,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(default_max_age())
    }
}

impl ReportGenerator {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Renders `instances` with ages measured from the current time.
    pub fn render(&self, instances: &[MatchedInstance], environment: &str) -> String {
        self.render_at(instances, environment, Utc::now())
    }

    /// Renders `instances` with ages measured from `now`.
    ///
    /// Instances are listed oldest first, then by cluster id. The output
    /// never ends with a newline.
    pub fn render_at(
        &self,
        instances: &[MatchedInstance],
        environment: &str,
        now: DateTime<Utc>,
    ) -> String {
        let threshold = describe_threshold(self.max_age);
        let mut message = format!(
            "Clusters getting checked for any stale clusters in *{}* environment...\n",
            environment
        );

        if instances.is_empty() {
            message.push_str(&format!(
                "No clusters were found to be older than {} :D",
                threshold
            ));
            return message;
        }

        message.push_str(&format!(
            "The following active clusters were found to be older than {}. \
             Please remove them if they aren't required anymore:\n",
            threshold
        ));

        let mut ordered: Vec<&MatchedInstance> = instances.iter().collect();
        ordered.sort_by(|a, b| {
            a.cluster
                .creation_timestamp
                .cmp(&b.cluster.creation_timestamp)
                .then_with(|| a.cluster.id.cmp(&b.cluster.id))
        });

        for instance in ordered {
            let cluster = &instance.cluster;
            let (age, created) = match cluster.creation_timestamp {
                Some(ts) => (
                    format_age(now.signed_duration_since(ts)),
                    ts.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                None => (String::new(), String::new()),
            };
            message.push_str(&format!(
                "\n*Cluster*: {}\n*ID*: {}\n*Owner*: {}\n*Age / Creation Timestamp*: {} / {}\n*Environment*: {}\n",
                cluster.name, cluster.external_id, instance.owner.username, age, created, environment
            ));
        }

        message.trim_end_matches('\n').to_string()
    }
}

/// Formats a duration as `"{d}d {h}h {m}m"`, dropping the day part under a day.
///
/// Negative durations render as zero.
pub fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes().max(0);
    let days = minutes / (24 * 60);
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else {
        format!("{}h {}m", hours, mins)
    }
}

/// Short form of an age threshold, e.g. `24h` or `90m`.
pub fn describe_threshold(max_age: Duration) -> String {
    let minutes = max_age.num_minutes();
    if minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}m", minutes)
    }
}
