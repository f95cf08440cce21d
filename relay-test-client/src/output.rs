use colored::*;

#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub details: String,
}

impl TestResult {
    pub fn pass(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            details: details.into(),
        }
    }

    pub fn fail(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            details: details.into(),
        }
    }
}

pub fn print_test_summary(results: &[TestResult]) {
    for result in results {
        let marker = if result.passed {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("{} {} - {}", marker, result.name.bold(), result.details);
    }

    let passed = results.iter().filter(|r| r.passed).count();
    println!("\n{} of {} tests passed", passed, results.len());
}
