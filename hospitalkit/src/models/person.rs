//! Formatting shared by patients and staff. The two record types stay
//! independent; these helpers only cover the name and age they both carry.

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}

pub fn describe_person(first_name: &str, last_name: &str, age: i32) -> String {
    format!("Name: {}, Age: {}", full_name(first_name, last_name), age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("Ahmed", "Hassan"), "Ahmed Hassan");
        assert_eq!(full_name(" Mona ", ""), "Mona");
    }

    #[test]
    fn test_describe_person() {
        assert_eq!(describe_person("Ahmed", "Hassan", 35), "Name: Ahmed Hassan, Age: 35");
    }
}
