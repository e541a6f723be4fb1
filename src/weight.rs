/// Units contributed by one occurrence of a session with this label.
pub fn weight_of(session_type: &str) -> u32 {
    if session_type.to_lowercase().contains("lab") {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labs_count_double() {
        assert_eq!(weight_of("Lab"), 2);
        assert_eq!(weight_of("lab session"), 2);
        assert_eq!(weight_of("Physics LAB"), 2);
    }

    #[test]
    fn everything_else_counts_once() {
        assert_eq!(weight_of("Lecture"), 1);
        assert_eq!(weight_of("Tutorial"), 1);
        assert_eq!(weight_of(""), 1);
    }
}
