use keepsake_core::models::PlaceName;

use super::{Address, AddressParts};

/// Tokens shorter than this are house numbers or abbreviations and get merged
/// with the following token.
const MIN_AREA_TOKEN_CHARS: usize = 4;

/// Reduce a geocoder answer to an (area, city, country) place.
///
/// City is the most specific settlement field present. Area prefers a named
/// landmark; otherwise it is the display-name token just before the city, or
/// the first token when the city does not appear. An empty area falls back to
/// the city.
pub fn derive_place_name(address: &Address) -> PlaceName {
    let tokens: Vec<&str> = address
        .display_name
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let city = settlement(&address.address).unwrap_or_default();

    let country = non_empty(&address.address.country)
        .or_else(|| tokens.last().map(|t| t.to_string()))
        .unwrap_or_default();

    let area = landmark(&address.address)
        .or_else(|| area_from_display(&tokens, &city))
        .unwrap_or_else(|| city.clone());

    PlaceName {
        area,
        city,
        country,
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_present(fields: &[&Option<String>]) -> Option<String> {
    fields.iter().find_map(|f| non_empty(f))
}

fn settlement(parts: &AddressParts) -> Option<String> {
    first_present(&[
        &parts.city,
        &parts.town,
        &parts.village,
        &parts.hamlet,
        &parts.municipality,
        &parts.county,
        &parts.state,
    ])
}

fn landmark(parts: &AddressParts) -> Option<String> {
    first_present(&[
        &parts.tourism,
        &parts.attraction,
        &parts.historic,
        &parts.leisure,
        &parts.amenity,
        &parts.building,
        &parts.natural,
    ])
}

fn area_from_display(tokens: &[&str], city: &str) -> Option<String> {
    let city_pos = if city.is_empty() {
        None
    } else {
        tokens.iter().position(|t| t.eq_ignore_ascii_case(city))
    };

    let idx = match city_pos {
        Some(0) => return None,
        Some(pos) => pos - 1,
        None => 0,
    };

    let candidate = *tokens.get(idx)?;
    if candidate.chars().count() >= MIN_AREA_TOKEN_CHARS {
        return Some(candidate.to_string());
    }

    match tokens.get(idx + 1) {
        Some(next) if !next.eq_ignore_ascii_case(city) => Some(format!("{} {}", candidate, next)),
        _ => Some(candidate.to_string()),
    }
}
