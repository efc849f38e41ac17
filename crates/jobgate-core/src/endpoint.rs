//! The two feature endpoints and their route identities.

use std::fmt;

use axum::http::{Method, StatusCode};

use crate::command::CommandName;

/// An endpoint mounted under [`FeatureEndpoint::PATH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureEndpoint {
    /// `GET /feature`: list available daemons.
    ListDaemons,
    /// `POST /feature`: schedule a job on a daemon.
    ScheduleJob,
}

impl FeatureEndpoint {
    pub const ALL: [FeatureEndpoint; 2] = [FeatureEndpoint::ListDaemons, FeatureEndpoint::ScheduleJob];

    /// Path shared by both endpoints.
    pub const PATH: &'static str = "/feature";

    /// Route name, e.g. `feature:listDaemons`.
    pub fn route_name(self) -> &'static str {
        match self {
            FeatureEndpoint::ListDaemons => "feature:listDaemons",
            FeatureEndpoint::ScheduleJob => "feature:scheduleJob",
        }
    }

    pub fn method(self) -> Method {
        match self {
            FeatureEndpoint::ListDaemons => Method::GET,
            FeatureEndpoint::ScheduleJob => Method::POST,
        }
    }

    /// The command a request to this endpoint becomes.
    pub fn command(self) -> CommandName {
        match self {
            FeatureEndpoint::ListDaemons => CommandName::ListDaemons,
            FeatureEndpoint::ScheduleJob => CommandName::ScheduleJob,
        }
    }

    /// Status returned when the command succeeds.
    pub fn success_status(self) -> StatusCode {
        match self {
            FeatureEndpoint::ListDaemons => StatusCode::OK,
            FeatureEndpoint::ScheduleJob => StatusCode::ACCEPTED,
        }
    }

    /// Route names this subsystem may publish.
    pub fn public_names() -> [&'static str; 2] {
        Self::ALL.map(Self::route_name)
    }
}

impl fmt::Display for FeatureEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_names() {
        assert_eq!(
            FeatureEndpoint::public_names(),
            ["feature:listDaemons", "feature:scheduleJob"]
        );
    }

    #[test]
    fn test_endpoint_mapping() {
        assert_eq!(FeatureEndpoint::ListDaemons.method(), Method::GET);
        assert_eq!(FeatureEndpoint::ScheduleJob.method(), Method::POST);
        assert_eq!(FeatureEndpoint::ListDaemons.command(), CommandName::ListDaemons);
        assert_eq!(FeatureEndpoint::ScheduleJob.command(), CommandName::ScheduleJob);
        assert_eq!(FeatureEndpoint::ScheduleJob.success_status(), StatusCode::ACCEPTED);
    }
}
