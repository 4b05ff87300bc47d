use std::cmp::Ordering;

use serde::Serialize;

use data_error::{DonutError, Result};
use data_model::filter_spec::FilterSpec;
use data_model::projection::Projection;
use data_model::record::UserRecord;

/// Apply the conjunctive predicates of `spec` to a collection snapshot.
///
/// Predicates run in a fixed order but are independent, so the result
/// set never depends on that order. When a reference user is
/// established, their own record is dropped before any predicate runs.
/// A record with a null value for a queried attribute never matches.
/// An empty result is a valid outcome, not an error.
pub fn filter(
    records: Vec<UserRecord>,
    spec: &FilterSpec,
    reference_user: Option<&str>,
) -> Result<Vec<UserRecord>> {
    let friend_filter = match (spec.friend_status, reference_user) {
        (Some(_), None) => return Err(DonutError::MissingReferenceUser),
        (Some(wanted), Some(me)) => Some((wanted, me)),
        (None, _) => None,
    };

    let mut users = records;
    let total = users.len();

    if let Some(me) = reference_user {
        users.retain(|user| !user.is_named(me));
    }

    if let Some(species) = &spec.species {
        users.retain(|user| matches_scalar(user.species.as_deref(), species));
    }
    if let Some((wanted, me)) = friend_filter {
        users.retain(|user| contains_ci(&user.friends, me) == wanted);
    }
    if let Some(min) = spec.min_high_score {
        users.retain(|user| user.high_score.map_or(false, |s| s >= min));
    }
    if let Some(option) = &spec.option {
        users.retain(|user| contains_ci(&user.option, option));
    }
    if let Some(house) = &spec.house {
        users.retain(|user| contains_ci(&user.house, house));
    }
    if let Some(gender) = &spec.gender {
        users.retain(|user| matches_scalar(user.gender.as_deref(), gender));
    }
    if let Some(graduation) = &spec.graduation {
        users.retain(|user| {
            matches_scalar(user.graduation.as_deref(), graduation)
        });
    }

    log::debug!("query: {} of {} records matched", users.len(), total);
    Ok(users)
}

/// Stable sort by high score; records without a score sort last
/// regardless of direction.
pub fn sort_by_high_score(users: &mut [UserRecord], descending: bool) {
    users.sort_by(|a, b| match (a.high_score, b.high_score) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            if descending {
                y.cmp(&x)
            } else {
                x.cmp(&y)
            }
        }
    });
}

/// Response payload of a projected listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectedUsers {
    /// `type=names`: one joined text value.
    Text(String),
    /// `type=image-paths`: non-null image paths.
    Paths(Vec<String>),
    /// `type=json` (default): full records.
    Records(Vec<UserRecord>),
}

/// Apply the requested projection to a filtered result, preserving
/// collection order.
pub fn project(users: Vec<UserRecord>, projection: Projection) -> ProjectedUsers {
    match projection {
        Projection::Names => {
            let names: Vec<String> =
                users.into_iter().map(|user| user.username).collect();
            ProjectedUsers::Text(names.join(", "))
        }
        Projection::ImagePaths => ProjectedUsers::Paths(image_paths(&users)),
        Projection::Json => ProjectedUsers::Records(users),
    }
}

/// Non-null image paths of `users`, in collection order.
pub fn image_paths(users: &[UserRecord]) -> Vec<String> {
    users
        .iter()
        .filter_map(|user| user.image_path.clone())
        .collect()
}

fn matches_scalar(actual: Option<&str>, wanted: &str) -> bool {
    actual.map_or(false, |value| value.eq_ignore_ascii_case(wanted))
}

fn contains_ci(values: &[String], wanted: &str) -> bool {
    values
        .iter()
        .any(|value| value.eq_ignore_ascii_case(wanted))
}
