use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Clientele, Service, ServiceFlags};

/// Resolve the service offering for a requested clientele and capability
/// triple.
///
/// Resolution order: exact match on all four attributes, then the best
/// superset within the clientele, then the best superset across all
/// clienteles (flags define eligibility, the clientele label does not).
/// "Best" prefers cutting, then washing, then coloring, true before
/// false.
pub fn find_service(
    conn: &Connection,
    clientele: Clientele,
    requested: &ServiceFlags,
) -> Result<Service, AppError> {
    if requested.none_requested() {
        return Err(AppError::NoServiceSelected);
    }

    if let Some(service) = queries::get_service_exact(conn, clientele, requested)? {
        return Ok(service);
    }

    let within = queries::get_services_for_clientele(conn, clientele)?;
    if let Some(service) = best_superset(within, requested) {
        return Ok(service);
    }

    let all = queries::get_all_services(conn)?;
    best_superset(all, requested).ok_or(AppError::ServiceNotFound)
}

fn best_superset(mut candidates: Vec<Service>, requested: &ServiceFlags) -> Option<Service> {
    candidates.retain(|s| s.flags().covers(requested));
    candidates.sort_by_key(|s| (!s.cutting, !s.washing, !s.coloring));
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup(catalog: &[(&str, &str, bool, bool, bool)]) -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        // Replace the seeded catalog with the scenario under test.
        conn.execute("DELETE FROM services", []).unwrap();
        for (id, clientele, washing, cutting, coloring) in catalog {
            conn.execute(
                "INSERT INTO services (id, clientele, washing, cutting, coloring)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, clientele, washing, cutting, coloring],
            )
            .unwrap();
        }
        conn
    }

    fn flags(washing: bool, cutting: bool, coloring: bool) -> ServiceFlags {
        ServiceFlags { washing, cutting, coloring }
    }

    #[test]
    fn zero_flags_is_rejected_before_querying() {
        let conn = setup(&[]);
        let err = find_service(&conn, Clientele::Male, &flags(false, false, false)).unwrap_err();
        assert!(matches!(err, AppError::NoServiceSelected));
    }

    #[test]
    fn exact_match_wins_over_wider_offering() {
        let conn = setup(&[
            ("cut-only", "male", false, true, false),
            ("wash-cut", "male", true, true, false),
        ]);
        let service = find_service(&conn, Clientele::Male, &flags(false, true, false)).unwrap();
        assert_eq!(service.id, "cut-only");
    }

    #[test]
    fn widens_to_superset_within_clientele() {
        let conn = setup(&[
            ("wash-cut", "male", true, true, false),
            ("color-only", "male", false, false, true),
        ]);
        // No exact cut-only row; wash-cut covers the request, color-only doesn't.
        let service = find_service(&conn, Clientele::Male, &flags(false, true, false)).unwrap();
        assert_eq!(service.id, "wash-cut");
    }

    #[test]
    fn superset_tie_break_prefers_cutting_then_washing_then_coloring() {
        let conn = setup(&[
            ("wash-color", "female", true, false, true),
            ("full", "female", true, true, true),
        ]);
        // Requesting wash only; both rows cover it, the cutting row sorts first.
        let service = find_service(&conn, Clientele::Female, &flags(true, false, false)).unwrap();
        assert_eq!(service.id, "full");
    }

    #[test]
    fn falls_back_across_clientele_when_own_has_no_cover() {
        let conn = setup(&[
            ("m-cut", "male", false, true, false),
            ("u-color", "unisex", false, false, true),
        ]);
        let service = find_service(&conn, Clientele::Male, &flags(false, false, true)).unwrap();
        assert_eq!(service.id, "u-color");
    }

    #[test]
    fn not_found_when_nothing_covers_anywhere() {
        let conn = setup(&[("m-cut", "male", false, true, false)]);
        let err = find_service(&conn, Clientele::Female, &flags(true, false, true)).unwrap_err();
        assert!(matches!(err, AppError::ServiceNotFound));
    }

    #[test]
    fn never_matches_a_service_offering_less_than_requested() {
        let conn = setup(&[("m-cut", "male", false, true, false)]);
        let err = find_service(&conn, Clientele::Male, &flags(true, true, false)).unwrap_err();
        assert!(matches!(err, AppError::ServiceNotFound));
    }
}
