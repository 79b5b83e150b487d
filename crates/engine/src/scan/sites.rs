//! Known job-site URL heuristics. A match means the page is worth proposing
//! for an auto-scan; it is not a guarantee that a posting is present.

use lazy_static::lazy_static;
use regex::Regex;

struct SitePattern {
    pattern: Regex,
    site: &'static str,
}

macro_rules! site {
    ($re:expr, $name:expr) => {
        SitePattern {
            pattern: Regex::new(concat!("(?i)", $re)).unwrap(),
            site: $name,
        }
    };
}

lazy_static! {
    static ref JOB_SITE_PATTERNS: Vec<SitePattern> = vec![
        // LinkedIn
        site!(r"linkedin\.com/jobs/view/", "LinkedIn"),
        site!(r"linkedin\.com/jobs/collections/", "LinkedIn"),
        site!(r"linkedin\.com/jobs/search/", "LinkedIn"),
        site!(r"linkedin\.com/jobs\?", "LinkedIn"),
        site!(r"linkedin\.com/jobs/?$", "LinkedIn"),
        site!(r"linkedin\.com/my-items/saved-jobs", "LinkedIn"),
        site!(r"currentJobId=", "LinkedIn"),
        // Indeed
        site!(r"indeed\.com/viewjob", "Indeed"),
        site!(r"indeed\.com/jobs\?", "Indeed"),
        // Greenhouse
        site!(r"boards\.greenhouse\.io/.*/jobs/", "Greenhouse"),
        site!(r"job-boards\.greenhouse\.io", "Greenhouse"),
        // Lever
        site!(r"jobs\.lever\.co/", "Lever"),
        // Workday
        site!(r"myworkdayjobs\.com/.*/job/", "Workday"),
        site!(r"wd\d+\.myworkdaysite\.com", "Workday"),
        // Glassdoor
        site!(r"glassdoor\.com/job-listing/", "Glassdoor"),
        // ZipRecruiter
        site!(r"ziprecruiter\.com/c/.*/job/", "ZipRecruiter"),
        site!(r"ziprecruiter\.com/jobs/", "ZipRecruiter"),
        // Monster
        site!(r"monster\.com/job-openings/", "Monster"),
        // Wellfound / AngelList
        site!(r"wellfound\.com/jobs", "Wellfound"),
        site!(r"angel\.co/company/.*/jobs", "AngelList"),
        // Dice
        site!(r"dice\.com/job-detail/", "Dice"),
        // SimplyHired
        site!(r"simplyhired\.com/job/", "SimplyHired"),
        // CareerBuilder
        site!(r"careerbuilder\.com/job/", "CareerBuilder"),
        // Built In
        site!(r"builtin\.com/job/", "BuiltIn"),
        // Generic career pages
        site!(r"careers\.[^/]+\.com/.*job", "Career Page"),
        site!(r"jobs\.[^/]+\.com/", "Jobs Page"),
        site!(r"/careers/.*positions?/", "Career Page"),
        site!(r"/jobs/\d+", "Job Page"),
    ];
}

/// Classifies a URL against the known job-site table. Returns the site name
/// of the first matching pattern, or `None` for pages that should not trigger
/// auto-scan.
pub fn detect_job_site(url: &str) -> Option<&'static str> {
    JOB_SITE_PATTERNS
        .iter()
        .find(|entry| entry.pattern.is_match(url))
        .map(|entry| entry.site)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_major_boards() {
        let cases = [
            ("https://www.linkedin.com/jobs/view/3951234567/", "LinkedIn"),
            ("https://www.linkedin.com/jobs/search/?currentJobId=39", "LinkedIn"),
            ("https://www.indeed.com/viewjob?jk=abc123", "Indeed"),
            ("https://boards.greenhouse.io/acme/jobs/4012345", "Greenhouse"),
            ("https://jobs.lever.co/acme/11111111-2222", "Lever"),
            ("https://acme.wd5.myworkdaysite.com/recruiting/acme/jobs", "Workday"),
            ("https://www.glassdoor.com/job-listing/rust-engineer-JV_IC1.htm", "Glassdoor"),
            ("https://wellfound.com/jobs?q=rust", "Wellfound"),
            ("https://www.dice.com/job-detail/abcd-1234", "Dice"),
            ("https://builtin.com/job/senior-rust-engineer/123", "BuiltIn"),
        ];
        for (url, site) in cases {
            assert_eq!(detect_job_site(url), Some(site), "for {url}");
        }
    }

    #[test]
    fn test_detects_generic_career_pages() {
        assert_eq!(
            detect_job_site("https://careers.acme.com/open-jobs"),
            Some("Career Page")
        );
        assert_eq!(detect_job_site("https://example.com/jobs/12345"), Some("Job Page"));
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        assert_eq!(
            detect_job_site("https://www.LinkedIn.com/Jobs/View/123"),
            Some("LinkedIn")
        );
    }

    #[test]
    fn test_ordinary_pages_do_not_match() {
        for url in [
            "https://news.ycombinator.com/",
            "https://www.linkedin.com/feed/",
            "https://docs.rs/regex",
            "https://example.com/blog/jobs-are-changing",
        ] {
            assert_eq!(detect_job_site(url), None, "for {url}");
        }
    }
}
