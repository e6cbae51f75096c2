use rusqlite::types::Value;

use roost_types::filter::ListingFilter;

/// Accumulates AND-ed predicates with positional `?` placeholders, so the
/// values must be bound in push order.
#[derive(Default)]
struct Predicates {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Predicates {
    fn push(&mut self, clause: String, value: Value) {
        self.clauses.push(clause);
        self.values.push(value);
    }

    fn real_range(&mut self, column: &str, min: Option<f64>, max: Option<f64>) {
        if let Some(min) = min {
            self.push(format!("{} >= ?", column), Value::Real(min));
        }
        if let Some(max) = max {
            self.push(format!("{} <= ?", column), Value::Real(max));
        }
    }

    fn int_range(&mut self, column: &str, min: Option<i64>, max: Option<i64>) {
        if let Some(min) = min {
            self.push(format!("{} >= ?", column), Value::Integer(min));
        }
        if let Some(max) = max {
            self.push(format!("{} <= ?", column), Value::Integer(max));
        }
    }

    /// Case-insensitive substring. An empty needle is no predicate at all.
    fn contains(&mut self, column: &str, needle: Option<&str>) {
        let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) else {
            return;
        };
        self.push(
            format!("instr(fold({}), fold(?)) > 0", column),
            Value::Text(needle.to_string()),
        );
    }

    fn flag(&mut self, column: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.push(format!("{} = ?", column), Value::Integer(value as i64));
        }
    }
}

/// Translate a filter into a WHERE clause plus its bound values.
/// `size` is an alias of the `area` column.
pub(crate) fn build(filter: &ListingFilter) -> (String, Vec<Value>) {
    let mut p = Predicates::default();

    p.real_range("price", filter.min_price, filter.max_price);
    p.real_range("area", filter.min_size, filter.max_size);
    p.real_range("area", filter.min_area, filter.max_area);
    p.real_range("annex_area", filter.min_annex_area, filter.max_annex_area);
    p.int_range("rooms", filter.min_rooms, filter.max_rooms);
    p.int_range("bedrooms", filter.min_bedrooms, filter.max_bedrooms);
    p.int_range("floor", filter.min_floor, filter.max_floor);

    p.contains("name", filter.name.as_deref());
    p.contains("title", filter.title.as_deref());
    p.contains("address", filter.address.as_deref());
    p.contains("city", filter.city.as_deref());
    p.contains("country", filter.country.as_deref());

    if let Some(kind) = filter.type_of_housing {
        p.push("type_of_housing = ?".to_string(), Value::Text(kind.as_str().to_string()));
    }

    p.flag("furnished", filter.furnished);
    p.flag("accessibility", filter.accessibility);

    if p.clauses.is_empty() {
        ("1 = 1".to_string(), p.values)
    } else {
        (p.clauses.join(" AND "), p.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let (clause, values) = build(&ListingFilter::default());
        assert_eq!(clause, "1 = 1");
        assert!(values.is_empty());
    }

    #[test]
    fn min_only_has_no_upper_bound() {
        let (clause, values) = build(&ListingFilter {
            min_price: Some(100.0),
            ..Default::default()
        });
        assert_eq!(clause, "price >= ?");
        assert_eq!(values, vec![Value::Real(100.0)]);
    }

    #[test]
    fn predicates_bind_in_order() {
        let (clause, values) = build(&ListingFilter {
            max_rooms: Some(4),
            city: Some("  Lyon ".into()),
            furnished: Some(false),
            ..Default::default()
        });
        assert_eq!(
            clause,
            "rooms <= ? AND instr(fold(city), fold(?)) > 0 AND furnished = ?"
        );
        assert_eq!(
            values,
            vec![Value::Integer(4), Value::Text("Lyon".into()), Value::Integer(0)]
        );
    }

    #[test]
    fn blank_text_is_ignored() {
        let (clause, _) = build(&ListingFilter {
            name: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(clause, "1 = 1");
    }
}
