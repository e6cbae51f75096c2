use std::str::FromStr;

use serde::Deserialize;

use crate::models::TypeOfHousing;

/// Every filterable listing attribute. Range bounds are inclusive and
/// independently optional; text fields match case-insensitive substrings;
/// booleans only filter when present, so `Some(false)` is a real predicate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub min_annex_area: Option<f64>,
    pub max_annex_area: Option<f64>,
    pub min_rooms: Option<i64>,
    pub max_rooms: Option<i64>,
    pub min_bedrooms: Option<i64>,
    pub max_bedrooms: Option<i64>,
    pub min_floor: Option<i64>,
    pub max_floor: Option<i64>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub type_of_housing: Option<TypeOfHousing>,
    pub furnished: Option<bool>,
    pub accessibility: Option<bool>,
}

/// A single filter dimension, as addressed by `/filter/{dimension}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Price,
    Size,
    Area,
    AnnexArea,
    Rooms,
    Bedrooms,
    Floor,
    Name,
    Title,
    Address,
    City,
    Country,
    TypeOfHousing,
    Furnished,
    Accessibility,
}

impl FromStr for FilterDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "price" => Self::Price,
            "size" => Self::Size,
            "area" => Self::Area,
            "annexArea" => Self::AnnexArea,
            "rooms" => Self::Rooms,
            "bedrooms" => Self::Bedrooms,
            "floor" => Self::Floor,
            "name" => Self::Name,
            "title" => Self::Title,
            "address" => Self::Address,
            "city" => Self::City,
            "country" => Self::Country,
            "typeOfHousing" => Self::TypeOfHousing,
            "furnished" => Self::Furnished,
            "accessibility" => Self::Accessibility,
            other => return Err(format!("unknown filter '{}'", other)),
        })
    }
}

impl ListingFilter {
    /// Keep only the predicate for `dim`, dropping every other parameter.
    pub fn only(self, dim: FilterDimension) -> Self {
        let mut out = Self::default();
        match dim {
            FilterDimension::Price => {
                out.min_price = self.min_price;
                out.max_price = self.max_price;
            }
            FilterDimension::Size => {
                out.min_size = self.min_size;
                out.max_size = self.max_size;
            }
            FilterDimension::Area => {
                out.min_area = self.min_area;
                out.max_area = self.max_area;
            }
            FilterDimension::AnnexArea => {
                out.min_annex_area = self.min_annex_area;
                out.max_annex_area = self.max_annex_area;
            }
            FilterDimension::Rooms => {
                out.min_rooms = self.min_rooms;
                out.max_rooms = self.max_rooms;
            }
            FilterDimension::Bedrooms => {
                out.min_bedrooms = self.min_bedrooms;
                out.max_bedrooms = self.max_bedrooms;
            }
            FilterDimension::Floor => {
                out.min_floor = self.min_floor;
                out.max_floor = self.max_floor;
            }
            FilterDimension::Name => out.name = self.name,
            FilterDimension::Title => out.title = self.title,
            FilterDimension::Address => out.address = self.address,
            FilterDimension::City => out.city = self.city,
            FilterDimension::Country => out.country = self.country,
            FilterDimension::TypeOfHousing => out.type_of_housing = self.type_of_housing,
            FilterDimension::Furnished => out.furnished = self.furnished,
            FilterDimension::Accessibility => out.accessibility = self.accessibility,
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_keeps_single_dimension() {
        let filter = ListingFilter {
            min_price: Some(100.0),
            max_price: Some(500.0),
            city: Some("lyon".into()),
            furnished: Some(false),
            ..Default::default()
        };

        let price = filter.clone().only(FilterDimension::Price);
        assert_eq!(price.min_price, Some(100.0));
        assert_eq!(price.max_price, Some(500.0));
        assert!(price.city.is_none());
        assert!(price.furnished.is_none());

        let furnished = filter.only(FilterDimension::Furnished);
        assert_eq!(furnished.furnished, Some(false));
        assert!(furnished.min_price.is_none());
    }

    #[test]
    fn dimension_names_match_routes() {
        assert_eq!("typeOfHousing".parse::<FilterDimension>(), Ok(FilterDimension::TypeOfHousing));
        assert_eq!("annexArea".parse::<FilterDimension>(), Ok(FilterDimension::AnnexArea));
        assert!("garden".parse::<FilterDimension>().is_err());
    }
}
