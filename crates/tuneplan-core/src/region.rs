use serde::Serialize;

/// AWS region where training jobs can run.
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
}

pub const REGIONS: &[Region] = &[
    Region { id: "us-east-1",      name: "US East (N. Virginia)" },
    Region { id: "us-east-2",      name: "US East (Ohio)" },
    Region { id: "us-west-2",      name: "US West (Oregon)" },
    Region { id: "eu-west-1",      name: "Europe (Ireland)" },
    Region { id: "eu-central-1",   name: "Europe (Frankfurt)" },
    Region { id: "ap-northeast-1", name: "Asia Pacific (Tokyo)" },
    Region { id: "ap-southeast-1", name: "Asia Pacific (Singapore)" },
];

pub fn find_region(id: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_have_valid_fields() {
        for r in REGIONS {
            assert!(!r.id.is_empty(), "id must not be empty");
            assert!(!r.name.is_empty(), "name must not be empty");
            assert!(r.id.contains('-'), "id should be an AWS region code: {}", r.id);
        }
    }

    #[test]
    fn region_ids_unique() {
        for (i, a) in REGIONS.iter().enumerate() {
            for b in &REGIONS[i + 1..] {
                assert_ne!(a.id, b.id, "duplicate region id");
            }
        }
    }

    #[test]
    fn find_region_by_id() {
        assert_eq!(find_region("us-east-1").map(|r| r.name), Some("US East (N. Virginia)"));
        assert!(find_region("mars-north-1").is_none());
    }
}
