//! Prompt templates. Product wording, kept verbatim.

use std::fmt::Write;

/// Requirement analyst prompt: grounding context plus user input.
pub fn requirement_prompt(context: &str, input: &str) -> String {
    format!(
        "당신은 소프트웨어 요구사항 분석가입니다. 다음 문맥 정보를 참고하여 사용자의 입력을 바탕으로 요구사항 명세서를 작성하세요.\n\
         \n\
         [문맥 정보]\n\
         {context}\n\
         \n\
         [사용자 입력]\n\
         {input}\n\
         \n\
         [요구사항 명세서]\n"
    )
}

/// Test engineer prompt enumerating the requirements.
pub fn testcase_prompt(requirements: &[String]) -> String {
    format!(
        "당신은 테스트 엔지니어입니다. 다음 요구사항 각각에 대해 테스트케이스를 작성하세요:\n{}",
        numbered(requirements)
    )
}

/// Traceability prompt asking for a JSON mapping of both lists.
pub fn traceability_prompt(requirements: &[String], testcases: &[String]) -> String {
    format!(
        "당신은 추적성 매트릭스 전문가입니다. 요구사항과 테스트케이스 매핑을 JSON으로 반환하세요.\n\
         요구사항:\n{}\n테스트케이스:\n{}",
        numbered(requirements),
        numbered(testcases)
    )
}

/// `1. a\n2. b`, 1-indexed, no trailing newline.
pub fn numbered(items: &[String]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}. {item}", i + 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn numbering_is_one_based() {
        assert_eq!(numbered(&list(&["가", "나"])), "1. 가\n2. 나");
        assert_eq!(numbered(&[]), "");
    }

    #[test]
    fn requirement_prompt_sections_in_order() {
        let prompt = requirement_prompt("CTX", "INPUT");
        let ctx = prompt.find("[문맥 정보]\nCTX").unwrap();
        let input = prompt.find("[사용자 입력]\nINPUT").unwrap();
        let spec = prompt.find("[요구사항 명세서]").unwrap();
        assert!(prompt.starts_with("당신은 소프트웨어 요구사항 분석가입니다."));
        assert!(ctx < input && input < spec);
    }

    #[test]
    fn testcase_prompt_lists_requirements() {
        let prompt = testcase_prompt(&list(&["로그인", "로그아웃"]));
        assert_eq!(
            prompt,
            "당신은 테스트 엔지니어입니다. 다음 요구사항 각각에 대해 테스트케이스를 작성하세요:\n\
             1. 로그인\n2. 로그아웃"
        );
    }

    #[test]
    fn traceability_prompt_lists_both() {
        let prompt = traceability_prompt(&list(&["R"]), &list(&["T1", "T2"]));
        assert!(prompt.contains("JSON"));
        assert!(prompt.ends_with("요구사항:\n1. R\n테스트케이스:\n1. T1\n2. T2"));
    }
}
