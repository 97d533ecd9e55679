//! Nearest-station resolution over a provider's station list.

use crate::geo::{distance_km, LatLon};

/// Finds the station closest to `target` by great-circle distance.
///
/// Stations for which `position` yields no usable coordinate are skipped.
/// After the minimum-distance station is selected, the provider-specific
/// `is_valid` predicate is applied to that winner alone: an invalid nearest
/// station (sentinel "instrument offline" values) suppresses the provider's
/// contribution entirely rather than falling back to the second-nearest.
/// No distance threshold is enforced; an arbitrarily far nearest station is
/// accepted when valid.
pub fn nearest_station<'a, T, P, V>(
    target: LatLon,
    stations: &'a [T],
    position: P,
    is_valid: V,
) -> Option<(&'a T, f64)>
where
    P: Fn(&T) -> Option<LatLon>,
    V: Fn(&T) -> bool,
{
    let mut nearest: Option<(&'a T, f64)> = None;

    for station in stations {
        let Some(coord) = position(station) else {
            continue;
        };
        let dist = distance_km(target, coord);
        match nearest {
            Some((_, best)) if dist >= best => {}
            _ => nearest = Some((station, dist)),
        }
    }

    let (winner, dist) = nearest?;
    if is_valid(winner) {
        Some((winner, dist))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        coord: Option<LatLon>,
        valid: bool,
    }

    fn fake(lat: f64, lon: f64, valid: bool) -> Fake {
        Fake {
            coord: Some(LatLon(lat, lon)),
            valid,
        }
    }

    #[test]
    fn picks_minimum_distance_station() {
        let target = LatLon(25.0, 121.5);
        let stations = vec![
            fake(25.5, 121.5, true),
            fake(25.01, 121.5, true),
            fake(24.0, 121.5, true),
        ];
        let (winner, dist) = nearest_station(target, &stations, |s| s.coord, |s| s.valid).unwrap();
        assert_eq!(winner.coord.unwrap().0, 25.01);
        assert!(dist < 2.0);
    }

    #[test]
    fn invalid_nearest_suppresses_provider_without_fallback() {
        let target = LatLon(25.0, 121.5);
        // Nearest (dist ~1km) is invalid; valid stations exist at ~5km and ~10km.
        let stations = vec![
            fake(25.045, 121.5, true),
            fake(25.009, 121.5, false),
            fake(25.09, 121.5, true),
        ];
        assert!(nearest_station(target, &stations, |s| s.coord, |s| s.valid).is_none());
    }

    #[test]
    fn stations_without_coordinates_are_skipped() {
        let target = LatLon(25.0, 121.5);
        let stations = vec![
            Fake {
                coord: None,
                valid: true,
            },
            fake(24.9, 121.5, true),
        ];
        let (winner, _) = nearest_station(target, &stations, |s| s.coord, |s| s.valid).unwrap();
        assert_eq!(winner.coord.unwrap().0, 24.9);
    }

    #[test]
    fn empty_list_yields_none() {
        let stations: Vec<Fake> = vec![];
        assert!(nearest_station(LatLon(0.0, 0.0), &stations, |s| s.coord, |s| s.valid).is_none());
    }

    #[test]
    fn far_nearest_station_is_still_accepted() {
        let target = LatLon(25.0, 121.5);
        let stations = vec![fake(21.6, 120.0, true)];
        let (_, dist) = nearest_station(target, &stations, |s| s.coord, |s| s.valid).unwrap();
        assert!(dist > 300.0);
    }
}
