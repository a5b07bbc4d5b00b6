//! Helpers for building filtered, sorted and paginated queries with bound
//! parameters. Column names passed here are always compile-time constants.

use sqlx::{Encode, Postgres, QueryBuilder, Type};

use crate::models::enums::{SortDirection, SortKey};

/// Appends `WHERE` / `AND` conditions to a query under construction
pub struct Conditions<'a, 'args> {
    qb: &'a mut QueryBuilder<'args, Postgres>,
    started: bool,
}

impl<'a, 'args> Conditions<'a, 'args> {
    pub fn new(qb: &'a mut QueryBuilder<'args, Postgres>) -> Self {
        Self { qb, started: false }
    }

    /// Open a new condition and hand back the builder to write it
    pub fn and(&mut self) -> &mut QueryBuilder<'args, Postgres> {
        self.qb.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
        &mut *self.qb
    }

    /// `column = value` when a value is given
    pub fn eq<T>(&mut self, column: &'static str, value: Option<T>)
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        if let Some(value) = value {
            self.and().push(column).push(" = ").push_bind(value);
        }
    }

    /// Case-insensitive `column = value` for free-text filters
    pub fn eq_ci(&mut self, column: &'static str, value: Option<&str>) {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.and()
                .push("LOWER(")
                .push(column)
                .push(") = ")
                .push_bind(value.to_lowercase());
        }
    }

    /// `column >= value` when a value is given
    pub fn gte<T>(&mut self, column: &'static str, value: Option<T>)
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        if let Some(value) = value {
            self.and().push(column).push(" >= ").push_bind(value);
        }
    }

    /// `column <= value` when a value is given
    pub fn lte<T>(&mut self, column: &'static str, value: Option<T>)
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        if let Some(value) = value {
            self.and().push(column).push(" <= ").push_bind(value);
        }
    }

    /// Substring match of `term` against any of `columns`
    pub fn search(&mut self, columns: &[&'static str], term: Option<&str>) {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));

        let qb = self.and();
        qb.push("(");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("LOWER(COALESCE(")
                .push(*column)
                .push(", '')) LIKE ")
                .push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

/// Escape LIKE wildcards so user input matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ORDER BY <whitelisted column> <dir>, <tiebreak> LIMIT $n OFFSET $m`
pub fn push_order_and_page<S: SortKey>(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: S,
    direction: SortDirection,
    tiebreak: &'static str,
    per_page: i64,
    offset: i64,
) {
    qb.push(" ORDER BY ")
        .push(sort.column())
        .push(" ")
        .push(direction.as_sql())
        .push(", ")
        .push(tiebreak)
        .push(" LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind(offset);
}

/// `LIMIT $n OFFSET $m` for lists with a fixed order
pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, per_page: i64, offset: i64) {
    qb.push(" LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind(offset);
}

/// `, column = $n` for each provided field of a partial update
pub fn set<'args, T>(qb: &mut QueryBuilder<'args, Postgres>, column: &'static str, value: Option<T>)
where
    T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
{
    if let Some(value) = value {
        qb.push(", ").push(column).push(" = ").push_bind(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::material::MaterialSort;

    #[test]
    fn test_conditions_join_with_and() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM materials");
        {
            let mut c = Conditions::new(&mut qb);
            c.eq("status", Some("active".to_string()));
            c.eq::<i32>("category_id", None);
            c.eq("location_id", Some(3));
        }
        assert_eq!(
            qb.sql(),
            "SELECT * FROM materials WHERE status = $1 AND location_id = $2"
        );
    }

    #[test]
    fn test_no_conditions_no_where() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM materials");
        {
            let mut c = Conditions::new(&mut qb);
            c.search(&["name"], Some("   "));
            c.eq_ci("unit", None);
        }
        assert_eq!(qb.sql(), "SELECT * FROM materials");
    }

    #[test]
    fn test_search_binds_once_per_column() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM materials");
        Conditions::new(&mut qb).search(&["name", "code"], Some("Drill"));
        assert_eq!(
            qb.sql(),
            "SELECT * FROM materials WHERE (LOWER(COALESCE(name, '')) LIKE $1 OR LOWER(COALESCE(code, '')) LIKE $2)"
        );
    }

    #[test]
    fn test_order_and_page_uses_whitelist() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM materials");
        push_order_and_page(&mut qb, MaterialSort::Quantity, SortDirection::Desc, "id", 20, 40);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM materials ORDER BY quantity DESC, id LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_partial_update() {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");
        set(&mut qb, "name", Some("Tools".to_string()));
        set::<String>(&mut qb, "description", None);
        set(&mut qb, "status", Some("inactive".to_string()));
        qb.push(" WHERE id = ").push_bind(7);
        assert_eq!(
            qb.sql(),
            "UPDATE categories SET updated_at = NOW(), name = $1, status = $2 WHERE id = $3"
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("hammer"), "hammer");
    }
}
