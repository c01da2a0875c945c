use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn book_body() -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    })
}

fn path_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "integer", "format": "int64" }
    })
}

/// OpenAPI fragment for the books module; paths are relative to the mount point.
pub fn openapi() -> Value {
    let id = path_param("id", "Identifier of the book");

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Every book in the catalog",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": {
                        "201": book_response("Book created"),
                        "400": error_response("Missing or invalid fields"),
                        "409": error_response("ISBN already registered")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book by id",
                    "tags": ["Books"],
                    "parameters": [id.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book's fields",
                    "tags": ["Books"],
                    "parameters": [id.clone()],
                    "requestBody": book_body(),
                    "responses": {
                        "200": book_response("Book updated"),
                        "400": error_response("Missing or invalid fields"),
                        "404": error_response("Book not found"),
                        "409": error_response("ISBN already registered")
                    }
                },
                "delete": {
                    "summary": "Remove a book",
                    "tags": ["Books"],
                    "parameters": [id],
                    "responses": {
                        "204": { "description": "Book removed" },
                        "404": error_response("Book not found")
                    }
                }
            },
            "/isbn/{isbn}": {
                "get": {
                    "summary": "Get a book by ISBN",
                    "tags": ["Books"],
                    "parameters": [path_param("isbn", "Numeric ISBN of the book")],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "integer",
                            "format": "int64",
                            "description": "Unique identifier assigned on creation"
                        },
                        "isbn": {
                            "type": "integer",
                            "format": "int64",
                            "description": "Unique numeric ISBN"
                        },
                        "title": { "type": "string", "description": "Title of the book" },
                        "author": { "type": "string", "description": "Author of the book" },
                        "publicationYear": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Year the book was published"
                        },
                        "stockQuantity": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Copies in stock"
                        }
                    },
                    "required": [
                        "id", "isbn", "title", "author", "publicationYear", "stockQuantity"
                    ]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "isbn": { "type": "integer", "format": "int64" },
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "publicationYear": { "type": "integer", "minimum": 1 },
                        "stockQuantity": { "type": "integer", "minimum": 1 }
                    },
                    "required": ["isbn", "title", "author", "publicationYear", "stockQuantity"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = openapi();
        let paths = doc["paths"].as_object().unwrap();

        for (path, method) in [
            ("/", "get"),
            ("/", "post"),
            ("/{id}", "get"),
            ("/{id}", "put"),
            ("/{id}", "delete"),
            ("/isbn/{isbn}", "get"),
            ("/health", "get"),
        ] {
            assert!(paths[path][method].is_object(), "{method} {path} undocumented");
        }
    }
}
