//! Example Cypher queries over the loaded graph

/// Ready-made queries offered alongside free-form input
pub const PREDEFINED_QUERIES: [&str; 12] = [
    "MATCH (c:Country) RETURN c.name LIMIT 10",
    "MATCH (c:Country)-[:HAS_CURRENCY]->(currency:Currency) RETURN c.name, currency.code LIMIT 10",
    "MATCH (c:Country)-[:LARGEST_CITY_IN]->(city:City) RETURN c.name, city.name LIMIT 10",
    "MATCH (c:Country)-[:SPEAKS]->(lang:Language) RETURN c.name, lang.name LIMIT 10",
    "MATCH (c:Country)-[:LOCATED_AT]->(city:City) RETURN c.name, city.name LIMIT 10",
    "MATCH (city:City)-[r]->(c:Country) RETURN city.name, type(r), c.name LIMIT 10",
    "MATCH (c:Country)-[:HAS_CURRENCY]->(currency:Currency) WHERE currency.code = 'USD' RETURN c.name",
    "MATCH (lang:Language)<-[:SPEAKS]-(c:Country) RETURN lang.name, c.name LIMIT 10",
    "MATCH p=(city:City)-[r]->() RETURN p LIMIT 25",
    "MATCH (c:Country)-[:LARGEST_CITY_IN]->(city:City) WHERE city.population > 1000000 RETURN c.name, city.name",
    "MATCH (c:Country)-[:LOCATED_AT]->(city:City) RETURN c.name, city.latitude, city.longitude LIMIT 10",
    "MATCH (currency:Currency)<-[:HAS_CURRENCY]-(c:Country) RETURN currency.code, c.name LIMIT 10",
];

/// Look up a predefined query by its 1-based position
pub fn predefined(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|i| PREDEFINED_QUERIES.get(i))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_lookup() {
        assert_eq!(predefined(1), Some(PREDEFINED_QUERIES[0]));
        assert_eq!(predefined(12), Some(PREDEFINED_QUERIES[11]));
        assert_eq!(predefined(0), None);
        assert_eq!(predefined(13), None);
    }

    #[test]
    fn test_predefined_are_read_only() {
        for query in PREDEFINED_QUERIES {
            let upper = query.to_uppercase();
            assert!(upper.starts_with("MATCH"));
            assert!(!upper.contains("MERGE") && !upper.contains("DELETE"));
        }
    }
}
