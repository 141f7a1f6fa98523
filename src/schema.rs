//! Diesel table definitions for the tables created by [`crate::db::initialize_schema`].

diesel::table! {
    article_topics (id) {
        id -> Integer,
        article_id -> Integer,
        topic_id -> Integer,
    }
}

diesel::table! {
    articles (id) {
        id -> Integer,
        source_id -> Integer,
        url -> Text,
        title -> Text,
        content -> Nullable<Text>,
        image_url -> Nullable<Text>,
        published_at -> Nullable<Timestamp>,
        fetched_at -> Timestamp,
        embedding -> Nullable<Binary>,
        embedding_model -> Nullable<Text>,
        is_duplicate -> Bool,
        duplicate_of_id -> Nullable<Integer>,
        processed_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    sources (id) {
        id -> Integer,
        name -> Text,
        feed_url -> Text,
        website_url -> Nullable<Text>,
        enabled -> Bool,
        last_fetched -> Nullable<Timestamp>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    topics (id) {
        id -> Integer,
        name -> Text,
        slug -> Text,
        keywords -> Text,
        embedding -> Nullable<Binary>,
        embedding_model -> Nullable<Text>,
    }
}

diesel::joinable!(article_topics -> articles (article_id));
diesel::joinable!(article_topics -> topics (topic_id));
diesel::joinable!(articles -> sources (source_id));

diesel::allow_tables_to_appear_in_same_query!(article_topics, articles, sources, topics,);
