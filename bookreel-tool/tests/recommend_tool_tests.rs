use bookreel_core::{
    BookreelError, Category, Genre, RecommendationRequest, RecommendationResult, Tool, ToolContext,
};
use bookreel_model::MockLlm;
use bookreel_tool::{
    CallContext, ToolRegistry, build_prompt, lookup, parse_titles, recommend_books,
    recommend_movies,
};
use bookreel_core::Command;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn ctx_with(model: Arc<MockLlm>) -> Arc<dyn ToolContext> {
    Arc::new(CallContext::new("session-1", "call-1", model))
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![Just(Category::Book), Just(Category::Movie)]
}

fn title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ':.!-]{0,20}[A-Za-z0-9]".prop_map(|s| s.to_string())
}

proptest! {
    #[test]
    fn prompt_names_genre_count_and_noun(category in category_strategy(), genre in ".{0,40}") {
        let prompt = build_prompt(category, &Genre::new(genre.clone()));
        prop_assert!(prompt.contains(&genre));
        prop_assert!(prompt.contains('3'));
        prop_assert!(prompt.contains(category.noun()));
    }

    #[test]
    fn comma_list_parses_in_order(
        titles in prop::collection::vec(title_strategy(), 1..6),
        pad in " {0,3}",
    ) {
        let text = titles
            .iter()
            .map(|t| format!("{pad}{t}{pad}"))
            .collect::<Vec<_>>()
            .join(",");
        let parsed = parse_titles(&text);
        prop_assert_eq!(&parsed, &titles);
        for title in &parsed {
            prop_assert_eq!(title.trim(), title.as_str());
        }
    }

    #[test]
    fn reparsing_parsed_titles_is_a_no_op(text in "[^,]{0,12}(,[^,]{0,12}){0,4}") {
        let once = parse_titles(&text);
        let twice: Vec<String> = once.iter().flat_map(|t| parse_titles(t)).collect();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn empty_response_is_one_empty_title() {
    let parsed = parse_titles("");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0], "");
}

#[test]
fn extra_whitespace_is_trimmed() {
    assert_eq!(
        parse_titles(" Dune ,  Foundation ,Neuromancer "),
        vec!["Dune", "Foundation", "Neuromancer"]
    );
}

#[tokio::test]
async fn lookup_books_science_fiction() {
    let model = MockLlm::new("mock").with_text("Dune, Foundation, Neuromancer");
    let result = lookup(&model, &RecommendationRequest::new(Category::Book, "science fiction"))
        .await
        .unwrap();

    assert_eq!(result.titles, vec!["Dune", "Foundation", "Neuromancer"]);
    let prompt = model.requests()[0].last_user_text().unwrap();
    assert!(prompt.contains("science fiction"));
    assert!(prompt.contains("books"));
}

#[tokio::test]
async fn lookup_movies_noir() {
    let model = MockLlm::new("mock").with_text("Chinatown,The Maltese Falcon,Double Indemnity");
    let result =
        lookup(&model, &RecommendationRequest::new(Category::Movie, "noir")).await.unwrap();
    assert_eq!(result.titles, vec!["Chinatown", "The Maltese Falcon", "Double Indemnity"]);
}

#[tokio::test]
async fn lookup_propagates_model_failure() {
    let model = MockLlm::new("mock").with_error(BookreelError::Model("upstream down".into()));
    let err =
        lookup(&model, &RecommendationRequest::new(Category::Movie, "noir")).await.unwrap_err();
    assert!(matches!(err, BookreelError::Model(msg) if msg == "upstream down"));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn lookup_empty_response_is_degenerate_not_error() {
    let model = MockLlm::new("mock").with_text("");
    let result =
        lookup(&model, &RecommendationRequest::new(Category::Book, "mystery")).await.unwrap();
    assert_eq!(result.titles, vec![String::new()]);
    assert!(result.has_empty_title());
}

#[tokio::test]
async fn recommend_books_tool_returns_books_object() {
    let model = Arc::new(MockLlm::new("mock").with_text("Dune, Foundation, Neuromancer"));
    let tool = recommend_books();
    assert_eq!(tool.name(), "recommend_books");
    assert_eq!(tool.parameters_schema().unwrap()["properties"]["genre"]["type"], "string");

    let output = tool.execute(ctx_with(model), json!({"genre": "science fiction"})).await.unwrap();
    assert_eq!(output, json!({"books": ["Dune", "Foundation", "Neuromancer"]}));
}

#[tokio::test]
async fn recommend_movies_tool_rejects_missing_genre() {
    let model = Arc::new(MockLlm::new("mock"));
    let err = recommend_movies().execute(ctx_with(model.clone()), json!({})).await.unwrap_err();
    assert!(matches!(err, BookreelError::Tool(_)));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn registry_dispatches_commands_to_matching_tool() {
    let model = Arc::new(
        MockLlm::new("mock").with_text("Chinatown,The Maltese Falcon,Double Indemnity"),
    );
    let registry = ToolRegistry::recommendations();
    assert_eq!(registry.names(), vec!["recommend_books", "recommend_movies"]);

    let output = registry
        .dispatch(ctx_with(model.clone()), &Command::new(Category::Movie, "noir"))
        .await
        .unwrap();
    let result = RecommendationResult::from_tool_output(Category::Movie, &output).unwrap();
    assert_eq!(result.titles, vec!["Chinatown", "The Maltese Falcon", "Double Indemnity"]);
    assert!(model.requests()[0].last_user_text().unwrap().contains("movies"));
}

#[tokio::test]
async fn registry_rejects_blank_genre_before_any_lookup() {
    let model = Arc::new(MockLlm::new("mock"));
    let err = ToolRegistry::recommendations()
        .dispatch(ctx_with(model.clone()), &Command::new(Category::Book, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, BookreelError::Agent(_)));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn registry_without_tool_errors() {
    let model = Arc::new(MockLlm::new("mock"));
    let err = ToolRegistry::new()
        .dispatch(ctx_with(model), &Command::new(Category::Book, "fantasy"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("recommend_books"));
}
